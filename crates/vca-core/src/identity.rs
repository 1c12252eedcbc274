//! # Identifier Newtypes
//!
//! You cannot pass a `StudentId` where a `CredentialId` is expected, and a
//! `Did` is only constructible from a string that carries the `did:` scheme.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a new random credential identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CredentialId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Internal identifier of a student (credential subject) known to the
/// identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    /// Wrap a student identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Decentralized Identifier (`did:<method>:<method-specific-id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

/// Error returned when a string is not a syntactically valid DID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a DID: {0:?}")]
pub struct InvalidDid(pub String);

impl Did {
    /// Parse a DID, requiring the `did:` scheme and non-empty method and
    /// method-specific id.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidDid> {
        let s = s.into();
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
                Ok(Self(s))
            }
            _ => Err(InvalidDid(s)),
        }
    }

    /// The DID method (`vca` in `did:vca:...`).
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Borrow the DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Did {
    type Error = InvalidDid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_ids_are_unique() {
        assert_ne!(CredentialId::new(), CredentialId::new());
    }

    #[test]
    fn credential_id_parse_roundtrip() {
        let id = CredentialId::new();
        let parsed: CredentialId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn did_parse_accepts_valid() {
        let did = Did::parse("did:vca:0123abcd").unwrap();
        assert_eq!(did.method(), "vca");
        assert_eq!(did.as_str(), "did:vca:0123abcd");
    }

    #[test]
    fn did_parse_rejects_invalid() {
        assert!(Did::parse("vca:0123").is_err());
        assert!(Did::parse("did::abc").is_err());
        assert!(Did::parse("did:vca:").is_err());
        assert!(Did::parse("").is_err());
    }

    #[test]
    fn did_serde_validates() {
        let ok: Did = serde_json::from_str("\"did:vca:ff\"").unwrap();
        assert_eq!(ok.method(), "vca");
        assert!(serde_json::from_str::<Did>("\"nope\"").is_err());
    }

    #[test]
    fn student_id_display() {
        assert_eq!(StudentId::new("STU001").to_string(), "STU001");
    }
}
