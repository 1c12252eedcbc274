//! # Credential Signer
//!
//! `VcSigner` turns a [`CredentialPayload`] into a signed compact token and
//! its SHA-256 hash. Issued-at comes from an injected [`Clock`], so signing
//! is deterministic for a given clock reading.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use vca_core::{sha256_bytes, Clock, ContentDigest, SystemClock};
use vca_crypto::{did_for_public_key, IssuerIdentity};

use crate::credential::CredentialPayload;
use crate::error::VcError;
use crate::token::{self, CredentialSubject, VcBody, VcClaims, VC_CONTEXT, VC_TYPE_MARKER};

/// Token lifetime, counted from issued-at.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// A signed credential: the compact token and `SHA-256(token)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCredential {
    pub token: String,
    pub hash: ContentDigest,
}

/// Signs credential payloads with the issuer identity.
#[derive(Clone)]
pub struct VcSigner {
    clock: Arc<dyn Clock>,
    validity_days: i64,
}

impl std::fmt::Debug for VcSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcSigner")
            .field("validity_days", &self.validity_days)
            .finish_non_exhaustive()
    }
}

impl Default for VcSigner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl VcSigner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }

    /// Override the token lifetime.
    pub fn with_validity_days(mut self, days: i64) -> Self {
        self.validity_days = days;
        self
    }

    /// Build the claim set for `payload` at the current clock reading.
    pub fn claims_for(&self, payload: &CredentialPayload) -> VcClaims {
        let issued_at = self.clock.now();
        let subject = payload.subject();
        VcClaims {
            iss: payload.issuer().to_string(),
            sub: subject.id.clone(),
            nbf: payload.not_before(),
            iat: issued_at.epoch_secs(),
            exp: issued_at.plus_days(self.validity_days).epoch_secs(),
            vc: VcBody {
                context: vec![VC_CONTEXT.to_string()],
                types: vec![
                    VC_TYPE_MARKER.to_string(),
                    payload.credential_type().as_str().to_string(),
                ],
                credential_subject: CredentialSubject {
                    id: subject.id.clone(),
                    name: subject.name.clone(),
                    title: payload.title().to_string(),
                    institution: payload.institution().to_string(),
                    date: payload.date_issued().format("%Y-%m-%d").to_string(),
                },
            },
        }
    }

    /// Sign `payload` with `identity`.
    ///
    /// # Errors
    ///
    /// - `VcError::InvalidPayload` if the payload names a different issuer.
    /// - `VcError::SigningError` if the identity's DID is not bound to its
    ///   public key, or the produced signature does not verify.
    pub fn sign(
        &self,
        payload: &CredentialPayload,
        identity: &IssuerIdentity,
    ) -> Result<SignedCredential, VcError> {
        if payload.issuer() != identity.did() {
            return Err(VcError::InvalidPayload(format!(
                "payload issuer {} does not match signing identity {}",
                payload.issuer(),
                identity.did()
            )));
        }
        let bound = did_for_public_key(identity.public_key())
            .map_err(|e| VcError::SigningError(e.to_string()))?;
        if &bound != identity.did() {
            return Err(VcError::SigningError(
                "issuer DID is not bound to the signing key".into(),
            ));
        }

        let claims = self.claims_for(payload);
        let token = token::encode(&claims, identity)?;
        self.self_check(&token, identity)?;

        let hash = sha256_bytes(token.as_bytes());
        tracing::debug!(
            issuer = %identity.did(),
            subject = %claims.sub,
            credential_type = %payload.credential_type(),
            hash = %hash,
            "credential signed"
        );
        Ok(SignedCredential { token, hash })
    }

    fn self_check(&self, token: &str, identity: &IssuerIdentity) -> Result<(), VcError> {
        token::decode_and_verify(token, identity.public_key())
            .map(|_| ())
            .map_err(|e| VcError::SigningError(format!("signed token failed self-check: {e}")))
    }
}
