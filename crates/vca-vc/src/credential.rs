//! # Credential Payload
//!
//! The unsigned input to [`VcSigner`](crate::VcSigner). Constructed once
//! through [`CredentialPayload::new`], which rejects missing or empty
//! required claims, and immutable afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use vca_core::{Did, Timestamp};

use crate::error::VcError;

/// The fixed set of academic credential types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// Bachelor's degree.
    Bachelor,
    /// Master's degree.
    Master,
    /// Course or professional certificate.
    Certificate,
    /// Diploma.
    Diploma,
}

impl CredentialType {
    /// Lowercase tag used in the token type array and in persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bachelor => "bachelor",
            Self::Master => "master",
            Self::Certificate => "certificate",
            Self::Diploma => "diploma",
        }
    }
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialType {
    type Err = VcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bachelor" => Ok(Self::Bachelor),
            "master" => Ok(Self::Master),
            "certificate" => Ok(Self::Certificate),
            "diploma" => Ok(Self::Diploma),
            other => Err(VcError::InvalidPayload(format!(
                "unknown credential type {other:?}"
            ))),
        }
    }
}

/// The credential subject as it appears in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject reference (`sub` claim): a student URN, a DID, or the
    /// anonymous sentinel.
    pub id: String,
    /// Human-readable subject name.
    pub name: String,
}

/// An unsigned credential payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    subject: Subject,
    issuer: Did,
    credential_type: CredentialType,
    title: String,
    institution: String,
    date_issued: NaiveDate,
}

impl CredentialPayload {
    /// Build a payload, trimming text claims.
    ///
    /// # Errors
    ///
    /// `VcError::InvalidPayload` if the subject id, subject name, title or
    /// institution is empty after trimming.
    pub fn new(
        subject: Subject,
        issuer: Did,
        credential_type: CredentialType,
        title: impl Into<String>,
        institution: impl Into<String>,
        date_issued: NaiveDate,
    ) -> Result<Self, VcError> {
        let subject = Subject {
            id: required("subject id", subject.id)?,
            name: required("subject name", subject.name)?,
        };
        Ok(Self {
            subject,
            issuer,
            credential_type,
            title: required("title", title.into())?,
            institution: required("institution", institution.into())?,
            date_issued,
        })
    }

    /// The credential subject.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The issuer DID.
    pub fn issuer(&self) -> &Did {
        &self.issuer
    }

    /// The credential type.
    pub fn credential_type(&self) -> CredentialType {
        self.credential_type
    }

    /// Credential title (e.g. "BSc Computer Science").
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Issuing institution.
    pub fn institution(&self) -> &str {
        &self.institution
    }

    /// Date the credential was conferred.
    pub fn date_issued(&self) -> NaiveDate {
        self.date_issued
    }

    /// `nbf` claim: epoch seconds at midnight UTC of the issue date.
    pub fn not_before(&self) -> i64 {
        Timestamp::start_of_day(self.date_issued).epoch_secs()
    }
}

fn required(field: &str, value: String) -> Result<String, VcError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VcError::InvalidPayload(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
