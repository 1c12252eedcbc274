//! # vca-cli: Credential Anchoring Command-Line Interface
//!
//! ## Subcommands
//!
//! - `identity`: print the issuer DID and public key
//! - `issue`: sign and store a new credential
//! - `anchor`: commit a credential hash to the ledger
//! - `revoke`: revoke a credential with a reason
//! - `verify`: look a credential up by hash
//! - `approve` / `accept`: record the two consent flags
//! - `show`: apply the disclosure gate to one or all credentials
//! - `check-chain`: verify ledger and audit log integrity
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers in `commands.rs`.
//! - Handlers delegate to `vca-lifecycle`; no credential logic here.
//! - State is loaded from and saved to one JSON snapshot per invocation.

pub mod commands;
pub mod config;
pub mod session;
