use chainlab_core::{Block, Blockchain};
use chainlab_storage::JsonFileStore;
use serde_json::json;
use tempfile::{tempdir, TempDir};

pub fn temp_store() -> (TempDir, JsonFileStore) {
    let dir = tempdir().expect("create temp dir");
    let store = JsonFileStore::open(dir.path()).expect("open chain store");
    (dir, store)
}

/// Genesis plus `mined_blocks` really-mined blocks, so the fixture chain
/// passes full validation.
pub fn mined_chain(mined_blocks: usize) -> Vec<Block> {
    let mut chain = Blockchain::new();
    for i in 0..mined_blocks {
        chain.add_block(json!({ "seq": i })).expect("mine block");
    }
    chain.blocks().to_vec()
}
