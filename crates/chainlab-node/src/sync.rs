//! Startup synchronization against a root node: fetch its chain and adopt
//! it when longer and valid.

use anyhow::{Context, Result};
use chainlab_core::Block;
use tracing::{info, warn};

use crate::node::ChainService;
use crate::routes::ChainResponse;

/// Best-effort one-shot sync. Fetch or parse failures are logged and leave
/// the local chain untouched.
pub async fn synchronize(service: &ChainService, peer: &str) {
    match fetch_chain(peer).await {
        Ok(chain) => {
            if service.replace_chain(chain).await {
                info!(peer, "adopted chain from peer");
            } else {
                info!(peer, "kept local chain, peer chain not longer or invalid");
            }
        }
        Err(err) => {
            warn!(peer, %err, "peer synchronization failed");
            service
                .error_log()
                .log_error("could not synchronize with peer", &err);
        }
    }
}

async fn fetch_chain(peer: &str) -> Result<Vec<Block>> {
    let url = format!("{}/api/blocks", peer.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("fetch {url}"))?;
    let body: ChainResponse = response
        .json()
        .await
        .context("parse peer chain response")?;
    Ok(body.data.chain)
}
