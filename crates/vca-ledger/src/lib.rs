//! # vca-ledger: Credential Anchoring Ledger
//!
//! An append-only hash chain. Each block commits one payload hash (a
//! credential hash) and is sealed by a small proof-of-work puzzle: the block
//! hash must start with a fixed number of zero hex digits.
//!
//! ```text
//! hash = SHA-256( height ‖ previousHash ‖ payloadHash ‖ nonce )
//! ```
//!
//! Fields are rendered as decimal (height, nonce) and lowercase hex
//! (hashes) and concatenated without separators. Block 0 links to the
//! all-zero [`GENESIS`] sentinel.
//!
//! ## Concurrency
//!
//! Appends are optimistic. A block is mined against a snapshot of the tip
//! and committed through [`BlockStore::commit`], which only accepts it if
//! its `previous_hash` still names the current tip. A miner that loses the
//! race re-reads the tip and mines again, so two blocks never extend the
//! same parent.
//!
//! ## Bounded Mining
//!
//! Every search runs under a [`MiningBudget`] (deadline, attempt cap,
//! cancel flag). When the budget runs out nothing is committed and the
//! chain is unchanged.

pub mod block;
pub mod chain;
pub mod error;
pub mod pow;
pub mod store;

pub use block::{compute_block_hash, LedgerBlock, GENESIS};
pub use chain::{verify_chain, ChainReport, Ledger, LedgerConfig};
pub use error::LedgerError;
pub use pow::{mine, Difficulty, MinedProof, MiningBudget, DEFAULT_MAX_ATTEMPTS};
pub use store::{BlockStore, CommitOutcome, InMemoryBlockStore};
