//! # vca-state: Credential Records
//!
//! The persisted side of a credential:
//!
//! - **Status** (`status.rs`): `pending → verified → revoked`, with an
//!   ordered transition log. `revoked` is terminal.
//! - **Record** (`record.rs`): `CredentialRecord`, its anchor reference and
//!   the two one-way consent flags.
//! - **Disclosure** (`disclosure.rs`): the dual-consent gate and the
//!   external `CredentialView` shape.
//! - **Store** (`store.rs`): `CredentialRepository` and its in-memory
//!   implementation, atomic per record.
//!
//! ## Disclosure Rule
//!
//! A credential is disclosed to a third party only when the inspecting
//! party has approved it **and** the subject has accepted it, and it has
//! not been revoked. The gate is evaluated on every read; the write
//! operations only flip flags.

pub mod disclosure;
pub mod error;
pub mod record;
pub mod status;
pub mod store;

pub use disclosure::{CredentialView, Disclosure, HiddenReason};
pub use error::CredentialError;
pub use record::{AnchorRef, CredentialRecord, NewCredential};
pub use status::{CredentialStatus, StatusTransition};
pub use store::{CredentialRepository, InMemoryCredentialStore};
