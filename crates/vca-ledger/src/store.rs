//! # Block Storage
//!
//! [`BlockStore`] is the persistence seam of the ledger. Its one
//! write, [`BlockStore::commit`], is a compare-and-swap on the tip: a block
//! is accepted only if it extends the block that is the tip at commit time.

use std::sync::Arc;

use parking_lot::RwLock;

use vca_core::ContentDigest;

use crate::block::{LedgerBlock, GENESIS};
use crate::error::LedgerError;

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The block is now the tip.
    Committed,
    /// Another block became the tip first. Carries the current tip's hash.
    StaleTip { current_tip: Option<ContentDigest> },
}

/// Storage for ledger blocks, ordered by height.
pub trait BlockStore: Send + Sync {
    /// Highest-height block, if any.
    fn tip(&self) -> Result<Option<LedgerBlock>, LedgerError>;

    /// Append `block` iff its `previous_hash` and `height` extend the
    /// current tip (or [`GENESIS`] and 0 on an empty store).
    fn commit(&self, block: LedgerBlock) -> Result<CommitOutcome, LedgerError>;

    /// Lowest-height block whose payload hash is `payload_hash`.
    fn find_by_payload(
        &self,
        payload_hash: &ContentDigest,
    ) -> Result<Option<LedgerBlock>, LedgerError>;

    /// Block at `height`.
    fn block_at(&self, height: u64) -> Result<Option<LedgerBlock>, LedgerError>;

    /// All blocks, genesis first.
    fn blocks(&self) -> Result<Vec<LedgerBlock>, LedgerError>;

    /// Number of blocks.
    fn len(&self) -> Result<u64, LedgerError>;
}

/// Thread-safe in-memory block store.
///
/// Uses `parking_lot::RwLock`, which does not poison: a panicking reader
/// leaves the chain usable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlockStore {
    blocks: Arc<RwLock<Vec<LedgerBlock>>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-validated blocks, genesis first.
    pub fn from_blocks(blocks: Vec<LedgerBlock>) -> Self {
        Self {
            blocks: Arc::new(RwLock::new(blocks)),
        }
    }
}

impl BlockStore for InMemoryBlockStore {
    fn tip(&self) -> Result<Option<LedgerBlock>, LedgerError> {
        Ok(self.blocks.read().last().cloned())
    }

    fn commit(&self, block: LedgerBlock) -> Result<CommitOutcome, LedgerError> {
        let mut guard = self.blocks.write();
        let (expected_prev, expected_height) = match guard.last() {
            Some(tip) => (tip.hash, tip.height + 1),
            None => (GENESIS, 0),
        };
        if block.previous_hash != expected_prev || block.height != expected_height {
            return Ok(CommitOutcome::StaleTip {
                current_tip: guard.last().map(|b| b.hash),
            });
        }
        guard.push(block);
        Ok(CommitOutcome::Committed)
    }

    fn find_by_payload(
        &self,
        payload_hash: &ContentDigest,
    ) -> Result<Option<LedgerBlock>, LedgerError> {
        Ok(self
            .blocks
            .read()
            .iter()
            .find(|b| &b.payload_hash == payload_hash)
            .cloned())
    }

    fn block_at(&self, height: u64) -> Result<Option<LedgerBlock>, LedgerError> {
        let Ok(index) = usize::try_from(height) else {
            return Ok(None);
        };
        Ok(self.blocks.read().get(index).cloned())
    }

    fn blocks(&self) -> Result<Vec<LedgerBlock>, LedgerError> {
        Ok(self.blocks.read().clone())
    }

    fn len(&self) -> Result<u64, LedgerError> {
        Ok(self.blocks.read().len() as u64)
    }
}
