//! # vca-vc: Verifiable Credentials
//!
//! - **Credential** (`credential.rs`): the immutable `CredentialPayload`
//!   (subject, issuer, type, claim set) and its validation.
//! - **Token** (`token.rs`): compact EdDSA-signed token encoding
//!   (`base64url(header).base64url(claims).base64url(signature)`), decoding
//!   and signature verification.
//! - **Signer** (`signer.rs`): `VcSigner`, which stamps issued-at/expiry from
//!   an injected clock, signs with the issuer key and returns the token with
//!   its SHA-256 hash.
//!
//! ## Security Invariant
//!
//! The claim set is serialized through `CanonicalBytes`, so the token bytes,
//! and therefore the credential hash, are a pure function of the payload,
//! the issuer key and the clock reading.

pub mod credential;
pub mod error;
pub mod signer;
pub mod token;

pub use credential::{CredentialPayload, CredentialType, Subject};
pub use error::VcError;
pub use signer::{SignedCredential, VcSigner, DEFAULT_VALIDITY_DAYS};
pub use token::{
    decode_and_verify, decode_unverified, CredentialSubject, TokenHeader, VcBody, VcClaims,
};
