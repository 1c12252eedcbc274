//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from key derivation, signing and verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The seed cannot produce a key pair.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Key bytes could not be parsed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Ed25519 signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Hex or length decoding of key/signature material failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}
