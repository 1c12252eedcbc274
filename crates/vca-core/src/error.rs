//! # Error Types: Leaf Errors
//!
//! Errors raised by the foundational types in this crate. Higher crates wrap
//! these through `#[from]` in their own `thiserror` enums; there is no single
//! workspace-wide error type.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a hex-encoded digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The input did not have exactly 64 hex characters.
    #[error("digest hex must be 64 chars, got {0}")]
    InvalidLength(usize),

    /// The input contained a non-hex character.
    #[error("invalid hex at position {0}")]
    InvalidHex(usize),
}

/// A timestamp string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimestampError {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}
