//! # Lifecycle Errors
//!
//! One error type for every lifecycle operation. [`LifecycleError::kind`]
//! tells the caller whether to retry, surface the error, or stop.

use thiserror::Error;

use vca_core::CredentialId;
use vca_ledger::LedgerError;
use vca_state::CredentialError;
use vca_vc::VcError;

/// How a caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing changed; the same call may succeed if repeated.
    Retryable,
    /// Bad input or unknown id; report it to the caller.
    Surface,
    /// Key material or chain integrity is broken; operator action needed.
    Fatal,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Vc(#[from] VcError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The record has no credential hash to anchor.
    #[error("credential {0} has no hash to anchor")]
    MissingHash(CredentialId),

    /// Re-anchoring is disabled and the record is already anchored.
    #[error("credential {id} is already anchored at block {block_height}")]
    AlreadyAnchored { id: CredentialId, block_height: u64 },

    /// A failed ledger integrity check stopped anchoring. It resumes once
    /// `verify_ledger` passes again.
    #[error("anchoring halted: ledger failed its integrity check")]
    AnchoringHalted,

    /// A snapshot could not be read, written or restored.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) if e.is_retryable() => ErrorKind::Retryable,
            Self::Ledger(LedgerError::ChainCorruption { .. }) => ErrorKind::Fatal,
            Self::Vc(VcError::SigningError(_)) => ErrorKind::Fatal,
            Self::AnchoringHalted => ErrorKind::Fatal,
            _ => ErrorKind::Surface,
        }
    }

    /// Shorthand for an unknown credential id.
    pub fn not_found(id: CredentialId) -> Self {
        Self::Credential(CredentialError::NotFound(id))
    }
}
