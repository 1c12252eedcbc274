//! # Compact Token Encoding
//!
//! Credentials are carried as compact EdDSA-signed tokens:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(signature)
//! ```
//!
//! Header and claims are canonical JSON (see `vca_core::CanonicalBytes`).
//! The signature covers the ASCII bytes of `header "." claims`, exactly as
//! they appear in the token. All segments use unpadded URL-safe base64.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use vca_core::CanonicalBytes;
use vca_crypto::{verify_with_public_key, Ed25519PublicKey, Ed25519Signature, IssuerIdentity};

use crate::error::VcError;

/// JOSE algorithm name for Ed25519 signatures.
pub const ALG_EDDSA: &str = "EdDSA";

/// Fixed JSON-LD context of every issued credential.
pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Fixed type marker preceding the credential type in `vc.type`.
pub const VC_TYPE_MARKER: &str = "VerifiableCredential";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

/// `credentialSubject` of the embedded credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: String,
    pub name: String,
    pub title: String,
    pub institution: String,
    /// Issue date, `YYYY-MM-DD`.
    pub date: String,
}

/// The embedded credential object (`vc` claim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcBody {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,
}

/// Registered claims plus the embedded credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcClaims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
    pub vc: VcBody,
}

/// Encode and sign `claims` as a compact token.
pub(crate) fn encode(claims: &VcClaims, identity: &IssuerIdentity) -> Result<String, VcError> {
    let header = TokenHeader {
        alg: ALG_EDDSA.to_string(),
        typ: "JWT".to_string(),
        kid: identity.key_id(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(CanonicalBytes::new(&header)?.as_bytes());
    let claims_b64 = URL_SAFE_NO_PAD.encode(CanonicalBytes::new(claims)?.as_bytes());
    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = identity.sign(signing_input.as_bytes());
    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.as_bytes())
    ))
}

/// Decode a token without checking its signature.
///
/// Only for inspection; use [`decode_and_verify`] before trusting claims.
pub fn decode_unverified(token: &str) -> Result<(TokenHeader, VcClaims), VcError> {
    let parts = split(token)?;
    Ok((decode_segment(parts.header, "header")?, decode_segment(parts.claims, "claims")?))
}

/// Decode a token and verify its EdDSA signature against `public_key`.
///
/// # Errors
///
/// - `VcError::MalformedToken` for structural or encoding problems, or a
///   header algorithm other than `EdDSA`.
/// - `VcError::Verification` if the signature does not verify.
pub fn decode_and_verify(
    token: &str,
    public_key: &Ed25519PublicKey,
) -> Result<VcClaims, VcError> {
    let parts = split(token)?;
    let header: TokenHeader = decode_segment(parts.header, "header")?;
    if header.alg != ALG_EDDSA {
        return Err(VcError::MalformedToken(format!(
            "unsupported algorithm {:?}",
            header.alg
        )));
    }
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(parts.signature)
        .map_err(|e| VcError::MalformedToken(format!("signature segment: {e}")))?;
    let signature = Ed25519Signature::from_slice(&sig_bytes)
        .map_err(|e| VcError::MalformedToken(e.to_string()))?;
    verify_with_public_key(parts.signing_input.as_bytes(), &signature, public_key)?;
    decode_segment(parts.claims, "claims")
}

struct Parts<'a> {
    header: &'a str,
    claims: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

fn split(token: &str) -> Result<Parts<'_>, VcError> {
    let token = token.trim();
    let (signing_input, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| VcError::MalformedToken("expected three segments".into()))?;
    let (header, claims) = signing_input
        .split_once('.')
        .ok_or_else(|| VcError::MalformedToken("expected three segments".into()))?;
    if claims.contains('.') || header.is_empty() || claims.is_empty() || signature.is_empty() {
        return Err(VcError::MalformedToken("expected three segments".into()));
    }
    Ok(Parts {
        header,
        claims,
        signature,
        signing_input,
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, VcError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VcError::MalformedToken(format!("{what} segment: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| VcError::MalformedToken(format!("{what} segment: {e}")))
}
