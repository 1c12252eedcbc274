//! # Ledger Blocks

use serde::{Deserialize, Serialize};

use vca_core::{sha256_bytes, ContentDigest};

/// `previous_hash` of the block at height 0.
pub const GENESIS: ContentDigest = ContentDigest::ZERO;

/// An immutable, mined block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBlock {
    pub height: u64,
    pub previous_hash: ContentDigest,
    pub payload_hash: ContentDigest,
    pub nonce: u64,
    pub hash: ContentDigest,
}

impl LedgerBlock {
    /// Recompute the block hash from its fields.
    pub fn recompute_hash(&self) -> ContentDigest {
        compute_block_hash(self.height, &self.previous_hash, &self.payload_hash, self.nonce)
    }

    /// Whether the stored hash matches the block's fields.
    pub fn hash_is_consistent(&self) -> bool {
        self.recompute_hash() == self.hash
    }
}

/// `SHA-256(height ‖ previous_hash ‖ payload_hash ‖ nonce)`.
pub fn compute_block_hash(
    height: u64,
    previous_hash: &ContentDigest,
    payload_hash: &ContentDigest,
    nonce: u64,
) -> ContentDigest {
    let preimage = format!("{height}{previous_hash}{payload_hash}{nonce}");
    sha256_bytes(preimage.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vca_core::sha256_hex;

    #[test]
    fn hash_preimage_is_plain_concatenation() {
        let payload = sha256_bytes(b"credential");
        let expected = sha256_hex(format!("0{}{}42", "0".repeat(64), payload.to_hex()).as_bytes());
        assert_eq!(compute_block_hash(0, &GENESIS, &payload, 42).to_hex(), expected);
    }

    #[test]
    fn every_field_feeds_the_hash() {
        let p = sha256_bytes(b"p");
        let q = sha256_bytes(b"q");
        let base = compute_block_hash(1, &p, &q, 5);
        assert_ne!(base, compute_block_hash(2, &p, &q, 5));
        assert_ne!(base, compute_block_hash(1, &q, &q, 5));
        assert_ne!(base, compute_block_hash(1, &p, &p, 5));
        assert_ne!(base, compute_block_hash(1, &p, &q, 6));
    }

    #[test]
    fn consistency_detects_tampering() {
        let payload = sha256_bytes(b"x");
        let mut block = LedgerBlock {
            height: 0,
            previous_hash: GENESIS,
            payload_hash: payload,
            nonce: 3,
            hash: compute_block_hash(0, &GENESIS, &payload, 3),
        };
        assert!(block.hash_is_consistent());
        block.nonce = 4;
        assert!(!block.hash_is_consistent());
    }

    #[test]
    fn serializes_camel_case() {
        let payload = sha256_bytes(b"x");
        let block = LedgerBlock {
            height: 0,
            previous_hash: GENESIS,
            payload_hash: payload,
            nonce: 0,
            hash: compute_block_hash(0, &GENESIS, &payload, 0),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert!(json.get("previousHash").is_some());
        assert!(json.get("payloadHash").is_some());
        let back: LedgerBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }
}
