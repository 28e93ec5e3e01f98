use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::mine::{mine_block_with, MineControl, MineError};
use crate::{genesis_block, Block};

/// Trait the storage backends implement so the node can hydrate and persist
/// the chain. Lives in core to avoid a circular dependency.
///
/// `load` returns `Ok(None)` when nothing has ever been persisted; errors are
/// reserved for unreadable or unparseable stores and are never fatal to the
/// caller — the in-memory chain stays authoritative.
pub trait ChainStore: Send + Sync {
    fn load(&self) -> Result<Option<Vec<Block>>>;
    fn save(&self, blocks: &[Block]) -> Result<()>;
}

/// Append-only, genesis-anchored sequence of blocks.
///
/// Not internally synchronized: a process-wide instance must be guarded by a
/// single writer lock around `add_block` / `append` / `replace_chain`.
#[derive(Clone, Debug)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// A chain holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![genesis_block()],
        }
    }

    /// Adopt a previously persisted chain wholesale. `None` unless the
    /// blocks form a valid non-empty chain.
    pub fn from_blocks(blocks: Vec<Block>) -> Option<Self> {
        if Self::is_valid_chain(&blocks) {
            Some(Self { blocks })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds at least the genesis block")
    }

    /// Mine a block with the given payload against the current tail and
    /// append it. Blocks the calling thread for the whole search.
    pub fn add_block(&mut self, data: Value) -> Result<&Block, MineError> {
        self.add_block_with(data, &MineControl::default())
    }

    pub fn add_block_with(
        &mut self,
        data: Value,
        control: &MineControl,
    ) -> Result<&Block, MineError> {
        let mined = mine_block_with(self.last_block(), data, control)?;
        self.blocks.push(mined);
        Ok(self.last_block())
    }

    /// Append a block mined elsewhere. Returns false without mutating when
    /// the block does not extend the current tail — the tip moved while the
    /// block was being mined.
    pub fn append(&mut self, block: Block) -> bool {
        if block.prev_hash != self.last_block().hash {
            return false;
        }
        self.blocks.push(block);
        true
    }

    /// The block at `index`, or `None` when out of range.
    pub fn get_block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Read-only view of the live chain. Callers needing a snapshot that
    /// outlives a lock clone the slice.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Pure validation of a candidate chain: element 0 must deep-equal the
    /// genesis block, and every later block must link to its predecessor's
    /// hash and reproduce its own hash under the canonical field order.
    ///
    /// The leading-zero proof-of-work property is not re-checked here beyond
    /// what hash equality implies; callers wanting the strict check run
    /// `meets_difficulty` per block.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        let Some(first) = blocks.first() else {
            return false;
        };
        if *first != genesis_block() {
            return false;
        }
        for pair in blocks.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.prev_hash != previous.hash {
                return false;
            }
            if current.compute_hash() != current.hash {
                return false;
            }
        }
        true
    }

    /// Longer-valid-wins fork resolution. Returns false without mutating for
    /// a candidate that is not strictly longer or not valid; otherwise the
    /// candidate replaces the chain wholesale.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            info!("incoming chain is not longer, keeping the current chain");
            return false;
        }
        if !Self::is_valid_chain(&candidate) {
            info!("incoming chain is invalid, keeping the current chain");
            return false;
        }
        info!(height = candidate.len(), "replacing chain with longer valid candidate");
        self.blocks = candidate;
        true
    }
}
