//! # vca-lifecycle: Credential Lifecycle
//!
//! Orchestrates issue, anchor, revoke, verify and the two consent flips
//! over the signer, ledger and credential repository.
//!
//! ```text
//! issue ──▶ VcSigner ──▶ repository (verified, flags false)
//!   │
//!   └─▶ anchor ──▶ Ledger::append(vc_hash) ──▶ record.anchor
//!
//! verify(hash) ──▶ repository lookup (read-only)
//! approve / accept ──▶ flags ──▶ disclosure gate on read
//! ```
//!
//! Every mutation is written to a hash-chained [`AuditLog`]. The whole
//! state can be captured as a [`LifecycleSnapshot`] and restored after an
//! integrity check.

pub mod audit;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod resolver;
pub mod snapshot;

pub use audit::{AuditAction, AuditChainReport, AuditEvent, AuditLog};
pub use config::{AnchorCheck, LifecycleConfig, ReanchorPolicy};
pub use error::{ErrorKind, LifecycleError};
pub use lifecycle::{CredentialLifecycle, IssueRequest, VerificationResult};
pub use resolver::{
    IdentityResolver, InMemoryDirectory, StudentIdentity, SubjectResolution, ANONYMOUS_SUBJECT,
};
pub use snapshot::{LifecycleSnapshot, SNAPSHOT_FORMAT_VERSION};

pub use vca_state::{CredentialView, Disclosure, HiddenReason};
