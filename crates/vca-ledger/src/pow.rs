//! # Proof-of-Work Search
//!
//! Increments the nonce from 0 until the block hash starts with
//! `difficulty` zero hex digits. The expected cost is `16^difficulty`
//! attempts, but the worst case is unbounded, so every search runs under a
//! [`MiningBudget`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use vca_core::ContentDigest;

use crate::block::compute_block_hash;
use crate::error::LedgerError;

/// Default attempt cap per search.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 10_000_000;

/// The deadline and cancel flag are polled once per this many attempts.
const POLL_INTERVAL: u64 = 1024;

/// Required number of leading zero hex digits in a block hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub const DEFAULT: Difficulty = Difficulty(3);

    /// # Errors
    ///
    /// `LedgerError::InvalidDifficulty` above 64 (a SHA-256 hex digest has
    /// 64 digits).
    pub fn new(zeros: u32) -> Result<Self, LedgerError> {
        if zeros > 64 {
            return Err(LedgerError::InvalidDifficulty(zeros));
        }
        Ok(Self(zeros))
    }

    pub fn zeros(&self) -> u32 {
        self.0
    }

    /// Whether `hash` meets this difficulty.
    pub fn is_satisfied_by(&self, hash: &ContentDigest) -> bool {
        hash.leading_zero_nibbles() >= self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = LedgerError;

    fn try_from(zeros: u32) -> Result<Self, Self::Error> {
        Self::new(zeros)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> u32 {
        d.0
    }
}

/// Limits on a single proof-of-work search.
#[derive(Debug, Clone)]
pub struct MiningBudget {
    deadline: Option<Instant>,
    max_attempts: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for MiningBudget {
    fn default() -> Self {
        Self {
            deadline: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cancel: None,
        }
    }
}

impl MiningBudget {
    /// Stop at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Stop after `max_attempts` hashes.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Stop once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn check(&self, attempts: u64) -> Result<(), LedgerError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(LedgerError::Cancelled { attempts });
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(LedgerError::ProofOfWorkTimeout { attempts });
            }
        }
        Ok(())
    }
}

/// A nonce that seals a block, with the hash it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedProof {
    pub nonce: u64,
    pub hash: ContentDigest,
    pub attempts: u64,
}

/// Search for a nonce sealing the block `(height, previous_hash, payload_hash)`.
///
/// # Errors
///
/// - `LedgerError::Cancelled` once the budget's cancel flag is set.
/// - `LedgerError::ProofOfWorkTimeout` past the deadline or attempt cap.
pub fn mine(
    height: u64,
    previous_hash: &ContentDigest,
    payload_hash: &ContentDigest,
    difficulty: Difficulty,
    budget: &MiningBudget,
) -> Result<MinedProof, LedgerError> {
    budget.check(0)?;
    let mut nonce: u64 = 0;
    let mut attempts: u64 = 0;
    while attempts < budget.max_attempts {
        let hash = compute_block_hash(height, previous_hash, payload_hash, nonce);
        attempts += 1;
        if difficulty.is_satisfied_by(&hash) {
            tracing::debug!(height, nonce, attempts, "proof of work found");
            return Ok(MinedProof {
                nonce,
                hash,
                attempts,
            });
        }
        if attempts % POLL_INTERVAL == 0 {
            budget.check(attempts)?;
        }
        nonce = nonce.wrapping_add(1);
    }
    Err(LedgerError::ProofOfWorkTimeout { attempts })
}
