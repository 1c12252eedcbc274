//! # Issuer Identity
//!
//! Derives the issuer's long-lived Ed25519 key pair and DID from a fixed
//! seed. Identical seeds always give identical keys and DIDs, so environments
//! and tests are reproducible.
//!
//! ## Seed Policy
//!
//! - Seeds shorter than [`SEED_LEN`] bytes are rejected with
//!   `CryptoError::InvalidSeed`. Zero-padding a short seed would silently
//!   produce a low-entropy key.
//! - Seeds longer than [`SEED_LEN`] bytes are truncated to their first
//!   [`SEED_LEN`] bytes.
//!
//! ## DID Format
//!
//! `did:vca:<hex(SHA-256(public_key)[..20])>`

use vca_core::{sha256_bytes, Did};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Number of seed bytes consumed by key derivation.
pub const SEED_LEN: usize = 32;

/// DID method used for issuer identifiers.
pub const DID_METHOD: &str = "vca";

const DID_ID_BYTES: usize = 20;

/// The issuer's signing identity.
///
/// Created once per process from the seed and immutable afterwards.
pub struct IssuerIdentity {
    did: Did,
    key_pair: Ed25519KeyPair,
    public_key: Ed25519PublicKey,
}

impl IssuerIdentity {
    /// The issuer DID.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// The issuer public key.
    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    /// DID URL of the verification method, used as the token `kid`.
    pub fn key_id(&self) -> String {
        format!("{}#key-1", self.did)
    }

    /// Sign a message with the issuer key.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.key_pair.sign(message)
    }
}

impl std::fmt::Debug for IssuerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerIdentity")
            .field("did", &self.did)
            .field("public_key", &self.public_key)
            .field("signing_key", &"<private>")
            .finish()
    }
}

/// Derive the issuer identity from `seed`.
///
/// # Errors
///
/// `CryptoError::InvalidSeed` if the seed is shorter than [`SEED_LEN`] bytes.
pub fn derive_identity(seed: &[u8]) -> Result<IssuerIdentity, CryptoError> {
    if seed.len() < SEED_LEN {
        return Err(CryptoError::InvalidSeed(format!(
            "seed must be at least {SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }
    if seed.len() > SEED_LEN {
        tracing::debug!(
            seed_len = seed.len(),
            "seed longer than {SEED_LEN} bytes; using the first {SEED_LEN}"
        );
    }
    let mut key_seed = [0u8; SEED_LEN];
    key_seed.copy_from_slice(&seed[..SEED_LEN]);

    let key_pair = Ed25519KeyPair::from_seed(&key_seed);
    key_seed.fill(0);

    let public_key = key_pair.public_key();
    let did = did_for_public_key(&public_key)?;
    Ok(IssuerIdentity {
        did,
        key_pair,
        public_key,
    })
}

/// Compute the DID bound to `public_key`.
pub fn did_for_public_key(public_key: &Ed25519PublicKey) -> Result<Did, CryptoError> {
    let digest = sha256_bytes(public_key.as_bytes());
    let id: String = digest.as_bytes()[..DID_ID_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Did::parse(format!("did:{DID_METHOD}:{id}")).map_err(|e| CryptoError::KeyError(e.to_string()))
}
