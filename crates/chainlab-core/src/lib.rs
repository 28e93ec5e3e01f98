use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub mod chain;
pub mod constants;
pub mod mine;

pub use chain::{Blockchain, ChainStore};
pub use mine::{adjust_difficulty, mine_block, mine_block_with, MineControl, MineError};

use constants::{GENESIS_HASH, GENESIS_PREV_HASH, GENESIS_TIMESTAMP, INITIAL_DIFFICULTY};

/// A single block in the chain. Immutable once constructed; mining is the
/// only way to produce a valid non-genesis block.
///
/// The JSON field names (`timestamp`, `hash`, `prevHash`, `data`, `nonce`,
/// `difficulty`) are the wire and storage contract shared with peers and the
/// on-disk chain file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Lowercase hex SHA-256 over this block's own fields. The genesis hash
    /// is a literal, not a digest.
    pub hash: String,
    /// Hash of the immediately preceding block.
    pub prev_hash: String,
    /// Arbitrary payload, opaque to the chain.
    pub data: Value,
    /// Proof-of-work search counter.
    pub nonce: u64,
    /// Required count of leading `'0'` hex digits in `hash`.
    pub difficulty: u32,
}

impl Block {
    /// Recompute this block's hash from its own fields using the canonical
    /// field order. Equal to `hash` for every honestly mined block.
    pub fn compute_hash(&self) -> String {
        block_hash(
            self.timestamp,
            &self.prev_hash,
            &self.data,
            self.nonce,
            self.difficulty,
        )
    }
}

/// The fixed first block every valid chain starts with. Exempt from the
/// hash and proof-of-work invariants; validation compares against it by
/// deep equality.
pub fn genesis_block() -> Block {
    Block {
        timestamp: GENESIS_TIMESTAMP,
        hash: GENESIS_HASH.to_string(),
        prev_hash: GENESIS_PREV_HASH.to_string(),
        data: Value::Array(Vec::new()),
        nonce: 0,
        difficulty: INITIAL_DIFFICULTY,
    }
}

/// Canonical preimage for a block hash: the five fields in mining order,
/// rendered as text and joined with `':'`. `data` is rendered as compact
/// JSON with object keys in sorted order, so the rendering is deterministic
/// for any payload. Changing this layout invalidates every stored chain.
fn hash_preimage(
    timestamp: u64,
    prev_hash: &str,
    data: &Value,
    nonce: u64,
    difficulty: u32,
) -> String {
    format!("{timestamp}:{prev_hash}:{data}:{nonce}:{difficulty}")
}

/// SHA-256 of the canonical preimage, lowercase hex. Both the mining loop
/// and chain validation go through this single function, so the two paths
/// cannot drift apart in field order.
pub fn block_hash(
    timestamp: u64,
    prev_hash: &str,
    data: &Value,
    nonce: u64,
    difficulty: u32,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_preimage(timestamp, prev_hash, data, nonce, difficulty).as_bytes());
    hex::encode(hasher.finalize())
}

/// Count of leading `'0'` hex digits in a hash string.
pub fn leading_zeros(hash: &str) -> u32 {
    hash.chars().take_while(|c| *c == '0').count() as u32
}

/// Whether `hash` satisfies the proof-of-work constraint for `difficulty`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    leading_zeros(hash) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn genesis_block_matches_the_fixed_constant() {
        let genesis = genesis_block();
        assert_eq!(genesis.timestamp, 1000);
        assert_eq!(genesis.hash, "genesis-hash");
        assert_eq!(genesis.prev_hash, "---");
        assert_eq!(genesis.data, json!([]));
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.difficulty, INITIAL_DIFFICULTY);
    }

    #[test]
    fn genesis_block_is_idempotent() {
        assert_eq!(genesis_block(), genesis_block());
    }

    #[test]
    fn preimage_layout_is_pinned() {
        // The canonical field order is timestamp, prevHash, data, nonce,
        // difficulty. Existing chains break if this changes.
        let preimage = hash_preimage(1000, "abc", &json!([1, 2]), 5, 2);
        assert_eq!(preimage, "1000:abc:[1,2]:5:2");
    }

    #[test]
    fn preimage_renders_objects_deterministically() {
        let a = hash_preimage(1, "p", &json!({"b": 2, "a": 1}), 0, 1);
        let b = hash_preimage(1, "p", &json!({"a": 1, "b": 2}), 0, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn block_hash_is_deterministic() {
        let data = json!({"msg": "hello"});
        let first = block_hash(1_600_000_000_000, "prev", &data, 7, 3);
        let second = block_hash(1_600_000_000_000, "prev", &data, 7, 3);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn block_hash_changes_with_every_field() {
        let data = json!([1, 2, 3]);
        let base = block_hash(1000, "prev", &data, 1, 2);
        assert_ne!(base, block_hash(1001, "prev", &data, 1, 2));
        assert_ne!(base, block_hash(1000, "other", &data, 1, 2));
        assert_ne!(base, block_hash(1000, "prev", &json!([1, 2]), 1, 2));
        assert_ne!(base, block_hash(1000, "prev", &data, 2, 2));
        assert_ne!(base, block_hash(1000, "prev", &data, 1, 3));
    }

    #[test]
    fn compute_hash_round_trips_a_block() {
        let data = json!({"sender": "melvin", "amount": 200});
        let hash = block_hash(42, "prev-hash", &data, 9, 1);
        let block = Block {
            timestamp: 42,
            hash: hash.clone(),
            prev_hash: "prev-hash".to_string(),
            data,
            nonce: 9,
            difficulty: 1,
        };
        assert_eq!(block.compute_hash(), hash);
    }

    #[test]
    fn leading_zeros_examples() {
        assert_eq!(leading_zeros("00ab3f"), 2);
        assert_eq!(leading_zeros("abc"), 0);
        assert_eq!(leading_zeros("0000"), 4);
        assert_eq!(leading_zeros(""), 0);
    }

    #[test]
    fn meets_difficulty_examples() {
        assert!(meets_difficulty("000fff", 3));
        assert!(meets_difficulty("000fff", 2));
        assert!(!meets_difficulty("000fff", 4));
        assert!(meets_difficulty("anything", 0));
    }

    #[test]
    fn block_serialization_uses_the_wire_field_names() {
        let json = serde_json::to_string(&genesis_block()).unwrap();
        let expected = r#"{"timestamp":1000,"hash":"genesis-hash","prevHash":"---","data":[],"nonce":0,"difficulty":3}"#;
        assert_eq!(json, expected);
        let decoded: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, genesis_block());
    }
}
