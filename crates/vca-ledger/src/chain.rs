//! # The Ledger
//!
//! [`Ledger`] is the sole writer of the chain. It mines against a tip
//! snapshot and commits through the store's compare-and-swap, retrying a
//! bounded number of times when another writer gets there first.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vca_core::ContentDigest;

use crate::block::{LedgerBlock, GENESIS};
use crate::error::LedgerError;
use crate::pow::{mine, Difficulty, MiningBudget, DEFAULT_MAX_ATTEMPTS};
use crate::store::{BlockStore, CommitOutcome, InMemoryBlockStore};

/// Default number of commit attempts before surfacing a conflict.
pub const DEFAULT_MAX_APPEND_RETRIES: u32 = 8;

/// Ledger tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub difficulty: Difficulty,
    /// Attempt cap for each proof-of-work search.
    pub max_attempts: u64,
    /// Wall-clock limit for one `append`, covering all retries.
    pub mining_timeout: Option<Duration>,
    /// Commit attempts before `ConcurrentAppendConflict`.
    pub max_append_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::DEFAULT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mining_timeout: None,
            max_append_retries: DEFAULT_MAX_APPEND_RETRIES,
        }
    }
}

impl LedgerConfig {
    /// Budget for one append started now.
    pub fn budget(&self) -> MiningBudget {
        let budget = MiningBudget::default().with_max_attempts(self.max_attempts);
        match self.mining_timeout {
            Some(timeout) => budget.with_timeout(timeout),
            None => budget,
        }
    }
}

/// Summary of a successful integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub blocks: u64,
    pub tip_hash: Option<ContentDigest>,
}

/// The append-only proof-of-work chain.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn BlockStore>,
    config: LedgerConfig,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Empty in-memory ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_store(Arc::new(InMemoryBlockStore::new()), config)
    }

    /// Ledger over an existing store. The store is not validated; call
    /// [`Ledger::verify_integrity`] when its contents are untrusted.
    pub fn with_store(store: Arc<dyn BlockStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Rebuild an in-memory ledger from persisted blocks.
    ///
    /// # Errors
    ///
    /// `LedgerError::ChainCorruption` if the blocks do not form a valid chain.
    pub fn restore(blocks: Vec<LedgerBlock>, config: LedgerConfig) -> Result<Self, LedgerError> {
        verify_chain(&blocks, config.difficulty)?;
        Ok(Self::with_store(
            Arc::new(InMemoryBlockStore::from_blocks(blocks)),
            config,
        ))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Highest-height block, or `None` on an empty chain.
    pub fn tip(&self) -> Result<Option<LedgerBlock>, LedgerError> {
        self.store.tip()
    }

    /// Mine and commit a block carrying `payload_hash`, using the
    /// configured budget.
    pub fn append(&self, payload_hash: ContentDigest) -> Result<LedgerBlock, LedgerError> {
        self.append_with_budget(payload_hash, &self.config.budget())
    }

    /// Mine and commit a block carrying `payload_hash` under `budget`.
    ///
    /// The chain is unchanged on any error.
    ///
    /// # Errors
    ///
    /// - `ProofOfWorkTimeout` / `Cancelled` when the budget runs out.
    /// - `ConcurrentAppendConflict` after `max_append_retries` lost races.
    pub fn append_with_budget(
        &self,
        payload_hash: ContentDigest,
        budget: &MiningBudget,
    ) -> Result<LedgerBlock, LedgerError> {
        let attempts = self.config.max_append_retries.max(1);
        for attempt in 1..=attempts {
            let tip = self.store.tip()?;
            let (height, previous_hash) = match &tip {
                Some(t) => (t.height + 1, t.hash),
                None => (0, GENESIS),
            };

            let proof = mine(
                height,
                &previous_hash,
                &payload_hash,
                self.config.difficulty,
                budget,
            )?;
            let block = LedgerBlock {
                height,
                previous_hash,
                payload_hash,
                nonce: proof.nonce,
                hash: proof.hash,
            };

            match self.store.commit(block.clone())? {
                CommitOutcome::Committed => {
                    tracing::debug!(
                        height,
                        nonce = block.nonce,
                        attempts = proof.attempts,
                        hash = %block.hash,
                        "block appended"
                    );
                    return Ok(block);
                }
                CommitOutcome::StaleTip { current_tip } => {
                    tracing::warn!(
                        height,
                        attempt,
                        current_tip = ?current_tip,
                        "chain tip moved while mining; retrying"
                    );
                }
            }
        }
        Err(LedgerError::ConcurrentAppendConflict { attempts })
    }

    /// Lowest-height block carrying `payload_hash`.
    pub fn find_block(&self, payload_hash: &ContentDigest) -> Result<Option<LedgerBlock>, LedgerError> {
        self.store.find_by_payload(payload_hash)
    }

    /// Block at `height`.
    pub fn block_at(&self, height: u64) -> Result<Option<LedgerBlock>, LedgerError> {
        self.store.block_at(height)
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> Result<Vec<LedgerBlock>, LedgerError> {
        self.store.blocks()
    }

    pub fn len(&self) -> Result<u64, LedgerError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Walk genesis to tip and check every block.
    ///
    /// # Errors
    ///
    /// `LedgerError::ChainCorruption` naming the first bad height.
    pub fn verify_integrity(&self) -> Result<ChainReport, LedgerError> {
        let blocks = self.store.blocks()?;
        verify_chain(&blocks, self.config.difficulty)
    }
}

/// Check that `blocks` form a valid chain at `difficulty`: consecutive
/// heights from 0, each `previous_hash` naming the prior block (or
/// [`GENESIS`]), each stored hash recomputable from the block's fields and
/// meeting the difficulty.
pub fn verify_chain(
    blocks: &[LedgerBlock],
    difficulty: Difficulty,
) -> Result<ChainReport, LedgerError> {
    let mut expected_prev = GENESIS;
    for (index, block) in blocks.iter().enumerate() {
        let expected_height = index as u64;
        let fail = |reason: String| {
            tracing::error!(height = expected_height, %reason, "ledger integrity check failed");
            Err(LedgerError::ChainCorruption {
                height: expected_height,
                reason,
            })
        };
        if block.height != expected_height {
            return fail(format!("stored height {}", block.height));
        }
        if block.previous_hash != expected_prev {
            return fail(format!(
                "previous hash {} does not match {}",
                block.previous_hash, expected_prev
            ));
        }
        if !block.hash_is_consistent() {
            return fail(format!("stored hash {} does not match block fields", block.hash));
        }
        if !difficulty.is_satisfied_by(&block.hash) {
            return fail(format!(
                "hash {} has fewer than {} leading zeros",
                block.hash,
                difficulty.zeros()
            ));
        }
        expected_prev = block.hash;
    }
    Ok(ChainReport {
        blocks: blocks.len() as u64,
        tip_hash: blocks.last().map(|b| b.hash),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use vca_core::sha256_bytes;

    fn fast() -> LedgerConfig {
        LedgerConfig {
            difficulty: Difficulty::new(1).unwrap(),
            ..LedgerConfig::default()
        }
    }

    #[test]
    fn empty_ledger_has_no_tip() {
        let ledger = Ledger::new(fast());
        assert_eq!(ledger.tip().unwrap(), None);
        assert!(ledger.is_empty().unwrap());
        assert_eq!(
            ledger.verify_integrity().unwrap(),
            ChainReport {
                blocks: 0,
                tip_hash: None
            }
        );
    }

    #[test]
    fn append_links_blocks() {
        let ledger = Ledger::new(fast());
        let b0 = ledger.append(sha256_bytes(b"one")).unwrap();
        let b1 = ledger.append(sha256_bytes(b"two")).unwrap();
        assert_eq!(b0.height, 0);
        assert_eq!(b0.previous_hash, GENESIS);
        assert_eq!(b1.height, 1);
        assert_eq!(b1.previous_hash, b0.hash);
        assert!(b1.hash.to_hex().starts_with('0'));
        assert_eq!(ledger.tip().unwrap(), Some(b1));
        assert_eq!(ledger.verify_integrity().unwrap().blocks, 2);
    }

    #[test]
    fn default_difficulty_mines_three_zeros() {
        let ledger = Ledger::new(LedgerConfig::default());
        let block = ledger.append(sha256_bytes(b"cert")).unwrap();
        assert!(block.hash.to_hex().starts_with("000"));
    }

    #[test]
    fn find_block_prefers_lowest_height() {
        let ledger = Ledger::new(fast());
        let payload = sha256_bytes(b"same");
        let first = ledger.append(payload).unwrap();
        ledger.append(sha256_bytes(b"between")).unwrap();
        let second = ledger.append(payload).unwrap();
        assert_ne!(first.hash, second.hash);
        assert_eq!(ledger.find_block(&payload).unwrap(), Some(first));
        assert_eq!(ledger.find_block(&sha256_bytes(b"none")).unwrap(), None);
    }

    #[test]
    fn timeout_leaves_chain_unchanged() {
        let ledger = Ledger::new(LedgerConfig {
            difficulty: Difficulty::new(64).unwrap(),
            max_attempts: 500,
            ..LedgerConfig::default()
        });
        let err = ledger.append(sha256_bytes(b"x")).unwrap_err();
        assert_eq!(err, LedgerError::ProofOfWorkTimeout { attempts: 500 });
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn cancelled_append_leaves_chain_unchanged() {
        let ledger = Ledger::new(fast());
        ledger.append(sha256_bytes(b"a")).unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);
        let budget = MiningBudget::default().with_cancel_flag(flag);
        let err = ledger
            .append_with_budget(sha256_bytes(b"b"), &budget)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled { .. }));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    /// Store that lets a rival block win the first `rivals` commits.
    struct RacingStore {
        inner: InMemoryBlockStore,
        rivals: Mutex<u32>,
    }

    impl BlockStore for RacingStore {
        fn tip(&self) -> Result<Option<LedgerBlock>, LedgerError> {
            self.inner.tip()
        }

        fn commit(&self, block: LedgerBlock) -> Result<CommitOutcome, LedgerError> {
            let mut rivals = self.rivals.lock();
            if *rivals > 0 {
                *rivals -= 1;
                let proof = mine(
                    block.height,
                    &block.previous_hash,
                    &sha256_bytes(b"rival"),
                    Difficulty::new(1).unwrap(),
                    &MiningBudget::default(),
                )?;
                self.inner.commit(LedgerBlock {
                    height: block.height,
                    previous_hash: block.previous_hash,
                    payload_hash: sha256_bytes(b"rival"),
                    nonce: proof.nonce,
                    hash: proof.hash,
                })?;
            }
            self.inner.commit(block)
        }

        fn find_by_payload(&self, h: &ContentDigest) -> Result<Option<LedgerBlock>, LedgerError> {
            self.inner.find_by_payload(h)
        }

        fn block_at(&self, height: u64) -> Result<Option<LedgerBlock>, LedgerError> {
            self.inner.block_at(height)
        }

        fn blocks(&self) -> Result<Vec<LedgerBlock>, LedgerError> {
            self.inner.blocks()
        }

        fn len(&self) -> Result<u64, LedgerError> {
            self.inner.len()
        }
    }

    #[test]
    fn lost_race_remines_on_new_tip() {
        let store = Arc::new(RacingStore {
            inner: InMemoryBlockStore::new(),
            rivals: Mutex::new(2),
        });
        let ledger = Ledger::with_store(store, fast());
        let block = ledger.append(sha256_bytes(b"mine")).unwrap();
        assert_eq!(block.height, 2);
        assert_eq!(ledger.len().unwrap(), 3);
        ledger.verify_integrity().unwrap();
    }

    #[test]
    fn persistent_losses_surface_conflict() {
        let store = Arc::new(RacingStore {
            inner: InMemoryBlockStore::new(),
            rivals: Mutex::new(u32::MAX),
        });
        let ledger = Ledger::with_store(
            store,
            LedgerConfig {
                max_append_retries: 3,
                ..fast()
            },
        );
        let err = ledger.append(sha256_bytes(b"mine")).unwrap_err();
        assert_eq!(err, LedgerError::ConcurrentAppendConflict { attempts: 3 });
        assert!(ledger.find_block(&sha256_bytes(b"mine")).unwrap().is_none());
    }

    #[test]
    fn integrity_detects_tampered_payload() {
        let ledger = Ledger::new(fast());
        ledger.append(sha256_bytes(b"a")).unwrap();
        ledger.append(sha256_bytes(b"b")).unwrap();
        let mut blocks = ledger.blocks().unwrap();
        blocks[1].payload_hash = sha256_bytes(b"forged");
        let err = verify_chain(&blocks, Difficulty::new(1).unwrap()).unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption { height: 1, .. }));
        assert!(Ledger::restore(blocks, fast()).is_err());
    }

    #[test]
    fn integrity_detects_broken_link() {
        let ledger = Ledger::new(fast());
        ledger.append(sha256_bytes(b"a")).unwrap();
        ledger.append(sha256_bytes(b"b")).unwrap();
        let mut blocks = ledger.blocks().unwrap();
        blocks.remove(0);
        let err = verify_chain(&blocks, Difficulty::new(1).unwrap()).unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption { height: 0, .. }));
    }

    #[test]
    fn integrity_detects_insufficient_work() {
        let ledger = Ledger::new(fast());
        ledger.append(sha256_bytes(b"a")).unwrap();
        let blocks = ledger.blocks().unwrap();
        let err = verify_chain(&blocks, Difficulty::new(64).unwrap()).unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption { height: 0, .. }));
    }

    #[test]
    fn restore_round_trip() {
        let ledger = Ledger::new(fast());
        ledger.append(sha256_bytes(b"a")).unwrap();
        ledger.append(sha256_bytes(b"b")).unwrap();
        let restored = Ledger::restore(ledger.blocks().unwrap(), fast()).unwrap();
        assert_eq!(restored.tip().unwrap(), ledger.tip().unwrap());
        let next = restored.append(sha256_bytes(b"c")).unwrap();
        assert_eq!(next.height, 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn chain_is_monotonic(payloads in proptest::collection::vec(any::<[u8; 8]>(), 1..8)) {
            let ledger = Ledger::new(fast());
            for p in &payloads {
                ledger.append(sha256_bytes(p)).unwrap();
            }
            let blocks = ledger.blocks().unwrap();
            prop_assert_eq!(blocks.len(), payloads.len());
            for (n, block) in blocks.iter().enumerate() {
                prop_assert_eq!(block.height, n as u64);
                let expected_prev = if n == 0 { GENESIS } else { blocks[n - 1].hash };
                prop_assert_eq!(block.previous_hash, expected_prev);
                prop_assert!(ledger.config().difficulty.is_satisfied_by(&block.hash));
            }
        }

        #[test]
        fn find_after_append(payload in any::<[u8; 16]>()) {
            let ledger = Ledger::new(fast());
            let hash = sha256_bytes(&payload);
            ledger.append(hash).unwrap();
            let found = ledger.find_block(&hash).unwrap();
            prop_assert_eq!(found.map(|b| b.payload_hash), Some(hash));
        }
    }
}
