/// Target interval between mined blocks, in milliseconds. Difficulty steps up
/// when blocks land faster than this and down when they land slower.
pub const MINE_RATE: u64 = 1000;

/// Difficulty carried by the genesis block, in leading zero hex digits.
pub const INITIAL_DIFFICULTY: u32 = 3;

pub const GENESIS_TIMESTAMP: u64 = 1000;
pub const GENESIS_PREV_HASH: &str = "---";
pub const GENESIS_HASH: &str = "genesis-hash";
