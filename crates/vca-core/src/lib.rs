//! # vca-core: Foundational Types
//!
//! Leaf crate of the credential anchoring workspace. Every other `vca-*`
//! crate depends on it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `CredentialId`, `StudentId` and
//!    `Did` are distinct types. No bare strings cross crate boundaries.
//!
//! 2. **`CanonicalBytes` newtype.** Signed credential claims are serialized
//!    through `CanonicalBytes::new()` (RFC 8785 / JCS) so the same payload
//!    always produces the same token bytes.
//!
//! 3. **UTC-only timestamps, injectable clock.** `Timestamp` is UTC with
//!    seconds precision. Anything that reads wall-clock time does so through
//!    the [`Clock`] trait so tests can pin it with [`FixedClock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vca-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, DigestError, TimestampError};
pub use identity::{CredentialId, Did, InvalidDid, StudentId};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
