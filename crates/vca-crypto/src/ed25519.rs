//! # Ed25519 Primitives
//!
//! Thin wrappers over `ed25519_dalek` for the one key the system holds: the
//! issuer's long-lived signing key. Keys are only ever built from a seed
//! (see [`derive_identity`](crate::derive_identity)); there is no random
//! generation path and no private-key export.
//!
//! Signatures travel inside compact tokens as raw bytes, so only the public
//! key has a text form (lowercase hex).

use ed25519_dalek::{Signer, Verifier};

use crate::error::CryptoError;

/// Length in bytes of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length in bytes of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 public key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; PUBLIC_KEY_LEN]);

/// An Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Ed25519Signature([u8; SIGNATURE_LEN]);

/// The issuer signing key. Not `Clone`, not `Serialize`.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Lowercase hex, as printed by `vca identity`.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("public key is not a curve point: {e}")))
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self.to_hex();
        write!(f, "Ed25519PublicKey({}..)", &hex[..8])
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Ed25519Signature {
    /// Signature from the third segment of a decoded token.
    ///
    /// # Errors
    ///
    /// `CryptoError::Encoding` unless `bytes` is exactly [`SIGNATURE_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        <[u8; SIGNATURE_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| {
                CryptoError::Encoding(format!(
                    "signature must be {SIGNATURE_LEN} bytes, got {}",
                    bytes.len()
                ))
            })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl Ed25519KeyPair {
    /// Key pair whose secret scalar is derived from `seed`.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("public_key", &self.public_key())
            .field("signing_key", &"<private>")
            .finish()
    }
}

/// Check `signature` over `message` against `public_key`.
///
/// # Errors
///
/// - `CryptoError::KeyError` if the key bytes are not a valid point.
/// - `CryptoError::VerificationFailed` if the signature does not match.
pub fn verify_with_public_key(
    message: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    public_key
        .verifying_key()?
        .verify(message, &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(byte: u8) -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed(&[byte; 32])
    }

    #[test]
    fn signature_verifies_under_own_key() {
        let kp = pair(7);
        let sig = kp.sign(b"header.claims");
        verify_with_public_key(b"header.claims", &sig, &kp.public_key()).unwrap();
    }

    #[test]
    fn other_key_rejects_signature() {
        let sig = pair(7).sign(b"msg");
        let err = verify_with_public_key(b"msg", &sig, &pair(8).public_key()).unwrap_err();
        assert!(matches!(err, CryptoError::VerificationFailed(_)));
    }

    #[test]
    fn altered_message_rejected() {
        let kp = pair(7);
        let sig = kp.sign(b"title=BSc");
        assert!(verify_with_public_key(b"title=PhD", &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn same_seed_signs_identically() {
        assert_eq!(pair(42).public_key(), pair(42).public_key());
        assert_eq!(pair(42).sign(b"x"), pair(42).sign(b"x"));
    }

    #[test]
    fn signature_length_enforced() {
        assert!(matches!(
            Ed25519Signature::from_slice(&[0u8; 63]),
            Err(CryptoError::Encoding(_))
        ));
        let sig = Ed25519Signature::from_slice(&[1u8; 64]).unwrap();
        assert_eq!(sig.as_bytes()[0], 1);
    }

    #[test]
    fn public_key_hex_is_64_lowercase_chars() {
        let hex = pair(3).public_key().to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(pair(3).public_key().to_string(), hex);
    }

    #[test]
    fn debug_hides_signing_key() {
        let dbg = format!("{:?}", pair(9));
        assert!(dbg.contains("<private>"));
        assert!(dbg.starts_with("Ed25519KeyPair"));
    }
}
