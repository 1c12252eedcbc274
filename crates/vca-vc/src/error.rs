//! # Credential Error Types

use thiserror::Error;

use vca_core::CanonicalizationError;
use vca_crypto::CryptoError;

/// Errors from building, signing and decoding credentials.
#[derive(Error, Debug)]
pub enum VcError {
    /// A required claim is missing or empty, or the payload is inconsistent.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Signing failed because of malformed or mismatched key material.
    #[error("signing error: {0}")]
    SigningError(String),

    /// The claim set could not be canonicalized.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A token did not have the expected compact structure.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// A token signature did not verify.
    #[error("token verification failed: {0}")]
    Verification(#[from] CryptoError),
}
