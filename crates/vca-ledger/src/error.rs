//! # Ledger Error Types

use thiserror::Error;

/// Errors from mining, appending and validating the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The mining budget ran out (deadline or attempt cap). Nothing was
    /// committed; safe to retry.
    #[error("proof-of-work search exhausted its budget after {attempts} attempts")]
    ProofOfWorkTimeout { attempts: u64 },

    /// The caller cancelled the search. Nothing was committed.
    #[error("proof-of-work search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    /// A block failed the integrity check. Fatal; anchoring must stop.
    #[error("chain corruption at height {height}: {reason}")]
    ChainCorruption { height: u64, reason: String },

    /// Every commit attempt lost the race for the tip.
    #[error("lost the race for the chain tip {attempts} times")]
    ConcurrentAppendConflict { attempts: u32 },

    /// Difficulty outside `0..=64` hex digits.
    #[error("invalid difficulty {0}: must be between 0 and 64")]
    InvalidDifficulty(u32),

    /// The backing block store failed.
    #[error("block store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Whether retrying the same append can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProofOfWorkTimeout { .. }
                | Self::Cancelled { .. }
                | Self::ConcurrentAppendConflict { .. }
        )
    }
}
