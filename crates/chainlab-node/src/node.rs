use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chainlab_core::{mine_block_with, Block, Blockchain, ChainStore, MineControl};
use chainlab_storage::ErrorLog;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task;
use tracing::{info, warn};

/// Process-wide owner of the chain state.
///
/// All mutation goes through this service: appends are serialized by the
/// mining gate and replacements take the write lock, so at most one in-flight
/// append can win the tail. Reads are consistent snapshots and are never
/// stalled by mining, which runs on a blocking thread without holding the
/// chain lock.
pub struct ChainService {
    chain: RwLock<Blockchain>,
    store: Arc<dyn ChainStore>,
    error_log: ErrorLog,
    mine_gate: Mutex<()>,
    cancel: Arc<AtomicBool>,
}

impl ChainService {
    pub fn new(store: Arc<dyn ChainStore>, error_log: ErrorLog) -> Self {
        Self {
            chain: RwLock::new(Blockchain::new()),
            store,
            error_log,
            mine_gate: Mutex::new(()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Adopt a persisted chain if one exists and validates. Read and parse
    /// failures keep the genesis-only chain; the node comes up regardless.
    pub async fn hydrate(&self) {
        match self.store.load() {
            Ok(Some(blocks)) => match Blockchain::from_blocks(blocks) {
                Some(stored) => {
                    info!(height = stored.len(), "hydrated chain from storage");
                    *self.chain.write().await = stored;
                }
                None => {
                    warn!("stored chain failed validation, starting from genesis");
                    self.error_log
                        .log_error("stored chain rejected", &"failed validation");
                }
            },
            Ok(None) => {
                info!("no stored chain found, starting from genesis");
            }
            Err(err) => {
                warn!(%err, "could not read stored chain, starting from genesis");
                self.error_log.log_error("could not read stored chain", &err);
            }
        }
    }

    /// Mine a block with the given payload and append it to the chain.
    ///
    /// The search runs on a blocking thread against a snapshot of the tip;
    /// at commit time the tip is re-checked so a replacement that landed
    /// mid-search discards the stale block instead of forking the tail.
    /// Persistence is dispatched fire-and-forget after the append commits.
    pub async fn add_block(&self, data: Value) -> Result<Block> {
        let _gate = self.mine_gate.lock().await;
        let last = self.chain.read().await.last_block().clone();
        let control = MineControl::cancelled_by(self.cancel.clone());
        let mined = task::spawn_blocking(move || mine_block_with(&last, data, &control))
            .await
            .context("mining task failed")??;

        let snapshot = {
            let mut chain = self.chain.write().await;
            if !chain.append(mined.clone()) {
                return Err(anyhow!("chain tip changed while mining, block discarded"));
            }
            chain.blocks().to_vec()
        };
        self.persist(snapshot);
        Ok(mined)
    }

    /// Longer-valid-wins chain replacement; persists the adopted chain.
    pub async fn replace_chain(&self, candidate: Vec<Block>) -> bool {
        let snapshot = {
            let mut chain = self.chain.write().await;
            if !chain.replace_chain(candidate) {
                return false;
            }
            chain.blocks().to_vec()
        };
        self.persist(snapshot);
        true
    }

    pub async fn get_block(&self, index: usize) -> Option<Block> {
        self.chain.read().await.get_block(index).cloned()
    }

    pub async fn all_blocks(&self) -> Vec<Block> {
        self.chain.read().await.blocks().to_vec()
    }

    pub async fn height(&self) -> usize {
        self.chain.read().await.len()
    }

    /// Aborts any in-flight nonce search; subsequent mining requests fail
    /// immediately with a cancelled error.
    pub fn cancel_mining(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Persist a snapshot on a background task. Failures go to the error
    /// log; the in-memory chain stays authoritative either way.
    fn persist(&self, snapshot: Vec<Block>) {
        let store = self.store.clone();
        let error_log = self.error_log.clone();
        tokio::spawn(async move {
            match task::spawn_blocking(move || store.save(&snapshot)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error_log.log_error("could not save chain", &err),
                Err(err) => error_log.log_error("chain save task failed", &err),
            }
        });
    }
}
