//! # Credential Status
//!
//! ```text
//! Pending ──▶ Verified ──▶ Revoked (terminal)
//!    │                        ▲
//!    └────────────────────────┘
//! ```
//!
//! Consent flags live beside the status and never change it.

use serde::{Deserialize, Serialize};

use vca_core::Timestamp;

/// Lifecycle status of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Created, signature not yet attached.
    Pending,
    /// Signed and live.
    Verified,
    /// Permanently withdrawn (terminal).
    Revoked,
}

impl CredentialStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether the machine allows `self → to`.
    pub fn can_transition_to(&self, to: CredentialStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Verified) | (Self::Pending | Self::Verified, Self::Revoked)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a record's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransition {
    pub from: CredentialStatus,
    pub to: CredentialStatus,
    pub at: Timestamp,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_moves() {
        use CredentialStatus::*;
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Revoked));
        assert!(Verified.can_transition_to(Revoked));
        assert!(!Verified.can_transition_to(Pending));
        assert!(!Revoked.can_transition_to(Verified));
        assert!(!Revoked.can_transition_to(Pending));
        assert!(!Revoked.can_transition_to(Revoked));
    }

    #[test]
    fn only_revoked_is_terminal() {
        assert!(CredentialStatus::Revoked.is_terminal());
        assert!(!CredentialStatus::Verified.is_terminal());
        assert!(!CredentialStatus::Pending.is_terminal());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CredentialStatus::Verified).unwrap(),
            "\"verified\""
        );
        assert_eq!(CredentialStatus::Revoked.to_string(), "revoked");
    }
}
