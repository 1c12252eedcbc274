//! # Credential Store Errors

use thiserror::Error;

use vca_core::CredentialId;

use crate::status::CredentialStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No record with this id.
    #[error("credential {0} not found")]
    NotFound(CredentialId),

    /// A record with this id already exists.
    #[error("credential {0} already exists")]
    DuplicateId(CredentialId),

    /// The status machine does not allow this move.
    #[error("invalid credential transition: {from} -> {to}")]
    InvalidTransition {
        from: CredentialStatus,
        to: CredentialStatus,
    },

    /// The record already carries an anchor and replacing it was not
    /// allowed.
    #[error("credential {id} is already anchored at block {block_height}")]
    AlreadyAnchored { id: CredentialId, block_height: u64 },

    /// The backing store failed.
    #[error("credential store error: {0}")]
    Store(String),
}
