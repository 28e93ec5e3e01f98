mod common;

use std::fs;

use chainlab_core::ChainStore;
use chainlab_storage::{ErrorLog, JsonFileStore};
use common::{mined_chain, temp_store};
use tempfile::tempdir;

#[tokio::test]
async fn round_trip_preserves_the_chain() -> anyhow::Result<()> {
    let (dir, store) = temp_store();
    let blocks = mined_chain(2);
    store.save(&blocks)?;
    let loaded = store.load()?.expect("chain should be present");
    assert_eq!(loaded, blocks);
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn load_returns_none_without_a_stored_file() -> anyhow::Result<()> {
    let (dir, store) = temp_store();
    assert!(store.load()?.is_none());
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn load_returns_none_for_an_empty_array() -> anyhow::Result<()> {
    let (dir, store) = temp_store();
    store.save(&[])?;
    assert!(store.load()?.is_none());
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn load_fails_on_a_corrupt_file() -> anyhow::Result<()> {
    let (dir, store) = temp_store();
    fs::write(store.path(), b"not json at all")?;
    assert!(store.load().is_err());
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn chain_survives_a_store_reopen() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let blocks = mined_chain(1);
    {
        let store = JsonFileStore::open(dir.path())?;
        store.save(&blocks)?;
    }
    let store = JsonFileStore::open(dir.path())?;
    let loaded = store.load()?.expect("chain should be present");
    assert_eq!(loaded, blocks);
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn save_replaces_the_previous_chain() -> anyhow::Result<()> {
    let (dir, store) = temp_store();
    store.save(&mined_chain(1))?;
    let longer = mined_chain(2);
    store.save(&longer)?;
    let loaded = store.load()?.expect("chain should be present");
    assert_eq!(loaded, longer);
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn error_log_appends_one_line_per_failure() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let log = ErrorLog::open(dir.path());
    log.log_error("could not save chain", &"disk full");
    log.log_error("could not read stored chain", &"permission denied");
    let contents = fs::read_to_string(log.path())?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("could not save chain - disk full"));
    assert!(lines[1].contains("could not read stored chain - permission denied"));
    dir.close()?;
    Ok(())
}

#[tokio::test]
async fn error_log_swallows_an_unwritable_sink() -> anyhow::Result<()> {
    let dir = tempdir()?;
    // Point the log at a directory path that is actually a file, so every
    // write attempt fails.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"")?;
    let log = ErrorLog::open(&blocker);
    log.log_error("still must not panic", &"sink unavailable");
    assert!(!log.path().exists());
    dir.close()?;
    Ok(())
}
