use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::constants::MINE_RATE;
use crate::{block_hash, meets_difficulty, Block};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MineError {
    #[error("mining was cancelled")]
    Cancelled,
    #[error("no valid nonce found within {0} iterations")]
    IterationLimit(u64),
}

/// Knobs for the nonce search. The default search is unbounded and
/// uncancellable, matching the plain mining loop.
#[derive(Clone, Debug, Default)]
pub struct MineControl {
    /// Checked on every iteration; a set flag aborts with `Cancelled`.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Aborts with `IterationLimit` once the nonce passes this bound.
    pub max_iterations: Option<u64>,
}

impl MineControl {
    pub fn cancelled_by(flag: Arc<AtomicBool>) -> Self {
        Self {
            cancel: Some(flag),
            max_iterations: None,
        }
    }

    pub fn capped(max_iterations: u64) -> Self {
        Self {
            cancel: None,
            max_iterations: Some(max_iterations),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}

/// One-step difficulty adjustment, floored at 1. A block that arrived more
/// than `MINE_RATE` ms after its parent eases the target by one digit,
/// anything faster tightens it by one.
pub fn adjust_difficulty(previous_block: &Block, timestamp: u64) -> u32 {
    let difficulty = previous_block.difficulty;
    if difficulty < 1 {
        return 1;
    }
    if timestamp.saturating_sub(previous_block.timestamp) > MINE_RATE {
        difficulty - 1
    } else {
        difficulty + 1
    }
}

/// Mine a block on top of `last_block` with an unbounded sequential search.
pub fn mine_block(last_block: &Block, data: Value) -> Result<Block, MineError> {
    mine_block_with(last_block, data, &MineControl::default())
}

/// Sequential proof-of-work search. The timestamp is re-read and the
/// difficulty recomputed on every nonce attempt, so the difficulty of the
/// mined block is always within one step of its parent's and can flip
/// mid-search when the wall clock crosses the mine-rate threshold.
///
/// Every iteration is a suspension point: the cancel flag and the iteration
/// cap are checked before each hash, so a shutdown or a superseding chain
/// replacement can abort the search.
pub fn mine_block_with(
    last_block: &Block,
    data: Value,
    control: &MineControl,
) -> Result<Block, MineError> {
    let prev_hash = last_block.hash.clone();
    let mut nonce: u64 = 0;
    loop {
        if control.is_cancelled() {
            return Err(MineError::Cancelled);
        }
        if let Some(max) = control.max_iterations {
            if nonce >= max {
                return Err(MineError::IterationLimit(max));
            }
        }
        nonce += 1;
        let timestamp = now_millis();
        let difficulty = adjust_difficulty(last_block, timestamp);
        let hash = block_hash(timestamp, &prev_hash, &data, nonce, difficulty);
        if meets_difficulty(&hash, difficulty) {
            info!(nonce, difficulty, "mined block");
            return Ok(Block {
                timestamp,
                hash,
                prev_hash,
                data,
                nonce,
                difficulty,
            });
        }
    }
}
