//! # vca-crypto: Issuer Key Material
//!
//! - **Ed25519** key pairs, signing and verification (`ed25519.rs`).
//! - **Issuer identity** (`identity.rs`): deterministic derivation of the
//!   long-lived signing key pair and its DID from a fixed seed.
//!
//! ## Security Invariant
//!
//! The private key never leaves process memory. `Ed25519KeyPair` and
//! `IssuerIdentity` do not implement `Serialize`, and their `Debug` output
//! is redacted. The underlying `ed25519_dalek::SigningKey` zeroizes on drop.
//!
//! ## Crate Policy
//!
//! - Depends only on `vca-core` internally.
//! - Tests use real Ed25519, never mocks.

pub mod ed25519;
pub mod error;
pub mod identity;

pub use ed25519::{
    verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, PUBLIC_KEY_LEN,
    SIGNATURE_LEN,
};
pub use error::CryptoError;
pub use identity::{derive_identity, did_for_public_key, IssuerIdentity, SEED_LEN};
