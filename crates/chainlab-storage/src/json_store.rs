use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chainlab_core::{Block, ChainStore};
use tracing::info;

/// Filename of the persisted chain inside the data directory.
pub const CHAIN_FILE: &str = "blockchain.json";

/// Whole-chain persistence as a pretty-printed JSON array of block records
/// at `<dir>/blockchain.json`. The array's field names are the block wire
/// contract, so a stored chain is directly exchangeable with peers.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("create data directory {}", dir.display()))?;
        let path = dir.join(CHAIN_FILE);
        info!(path = %path.display(), "chain store opened");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", self.path.display()))
            }
        };
        let blocks: Vec<Block> = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", self.path.display()))?;
        if blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some(blocks))
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        let json = serde_json::to_string_pretty(blocks).context("serialize chain")?;
        // Write-then-rename so a crash mid-write leaves the previous chain
        // file intact.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes())
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename into {}", self.path.display()))?;
        Ok(())
    }
}
