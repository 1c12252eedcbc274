//! # Subject Resolution
//!
//! `issue` maps an external student reference to an internal identity:
//! exact internal-id lookup first, then lookup by username. When neither
//! matches, the credential is issued anonymously instead of failing, so
//! subjects who have not onboarded yet can still receive credentials.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use vca_core::StudentId;
use vca_vc::Subject;

/// Subject reference and name used for anonymous issuance.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// A known student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub id: StudentId,
    pub username: String,
    pub name: String,
}

/// The identity-resolution collaborator.
pub trait IdentityResolver: Send + Sync {
    fn by_id(&self, id: &str) -> Option<StudentIdentity>;
    fn by_username(&self, username: &str) -> Option<StudentIdentity>;
}

/// Result of resolving a subject for issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectResolution {
    Resolved(StudentIdentity),
    Anonymous { name: String },
}

impl SubjectResolution {
    /// Resolve `student_ref` through `resolver`.
    ///
    /// `fallback_name` names an anonymous subject; when it is missing or
    /// blank the sentinel is used.
    pub fn resolve(
        resolver: &dyn IdentityResolver,
        student_ref: Option<&str>,
        fallback_name: Option<&str>,
    ) -> Self {
        let found = student_ref
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .and_then(|r| resolver.by_id(r).or_else(|| resolver.by_username(r)));
        match found {
            Some(student) => Self::Resolved(student),
            None => Self::Anonymous {
                name: fallback_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(ANONYMOUS_SUBJECT)
                    .to_string(),
            },
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous { .. })
    }

    pub fn student_id(&self) -> Option<&StudentId> {
        match self {
            Self::Resolved(student) => Some(&student.id),
            Self::Anonymous { .. } => None,
        }
    }

    /// The token subject.
    pub fn subject(&self) -> Subject {
        match self {
            Self::Resolved(student) => Subject {
                id: format!("urn:vca:student:{}", student.id),
                name: student.name.clone(),
            },
            Self::Anonymous { name } => Subject {
                id: name.clone(),
                name: name.clone(),
            },
        }
    }
}

/// In-memory student directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<RwLock<Directory>>,
}

#[derive(Debug, Default)]
struct Directory {
    by_id: HashMap<String, StudentIdentity>,
    id_by_username: HashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a student, replacing any entry with the same id.
    pub fn add(&self, student: StudentIdentity) {
        let mut dir = self.inner.write();
        let id = student.id.as_str().to_string();
        dir.id_by_username.insert(student.username.clone(), id.clone());
        dir.by_id.insert(id, student);
    }

    pub fn with_students(students: impl IntoIterator<Item = StudentIdentity>) -> Self {
        let dir = Self::new();
        for s in students {
            dir.add(s);
        }
        dir
    }
}

impl IdentityResolver for InMemoryDirectory {
    fn by_id(&self, id: &str) -> Option<StudentIdentity> {
        self.inner.read().by_id.get(id).cloned()
    }

    fn by_username(&self, username: &str) -> Option<StudentIdentity> {
        let dir = self.inner.read();
        dir.id_by_username
            .get(username)
            .and_then(|id| dir.by_id.get(id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::with_students([
            StudentIdentity {
                id: StudentId::new("STU001"),
                username: "ada".into(),
                name: "Ada Lovelace".into(),
            },
            StudentIdentity {
                id: StudentId::new("ada"),
                username: "imposter".into(),
                name: "Id Wins".into(),
            },
        ])
    }

    #[test]
    fn resolves_by_id() {
        let r = SubjectResolution::resolve(&directory(), Some("STU001"), None);
        assert_eq!(r.student_id(), Some(&StudentId::new("STU001")));
        assert_eq!(r.subject().id, "urn:vca:student:STU001");
    }

    #[test]
    fn id_lookup_precedes_username() {
        let r = SubjectResolution::resolve(&directory(), Some("ada"), None);
        let SubjectResolution::Resolved(student) = r else {
            panic!("expected resolved");
        };
        assert_eq!(student.name, "Id Wins");
    }

    #[test]
    fn resolves_by_username() {
        let r = SubjectResolution::resolve(&directory(), Some("imposter"), None);
        assert_eq!(r.student_id(), Some(&StudentId::new("ada")));
    }

    #[test]
    fn unknown_reference_is_anonymous_with_name() {
        let r = SubjectResolution::resolve(&directory(), Some("STU999"), Some("Grace Hopper"));
        assert!(r.is_anonymous());
        assert_eq!(r.subject().name, "Grace Hopper");
        assert_eq!(r.student_id(), None);
    }

    #[test]
    fn missing_reference_and_name_use_sentinel() {
        let r = SubjectResolution::resolve(&directory(), None, Some("  "));
        assert_eq!(
            r,
            SubjectResolution::Anonymous {
                name: ANONYMOUS_SUBJECT.into()
            }
        );
        assert_eq!(r.subject().id, ANONYMOUS_SUBJECT);
    }
}
