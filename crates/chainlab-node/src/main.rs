//! Node entrypoint: wires the chain service to storage and the HTTP surface.

mod node;
mod routes;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use chainlab_storage::{ErrorLog, JsonFileStore};
use clap::Parser;
use node::ChainService;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Directory for the persisted chain file
    #[arg(long, default_value = "./data")]
    data_dir: String,

    /// Directory for the error log
    #[arg(long, default_value = "./logs")]
    log_dir: String,

    /// Root node to synchronize from at startup, e.g. http://127.0.0.1:3000
    #[arg(long)]
    peer: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = Arc::new(JsonFileStore::open(&args.data_dir)?);
    let error_log = ErrorLog::open(&args.log_dir);
    let service = Arc::new(ChainService::new(store, error_log));
    service.hydrate().await;

    if let Some(peer) = &args.peer {
        sync::synchronize(&service, peer).await;
    }

    let app = routes::router(service.clone());
    let addr: SocketAddr = args.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("chainlab-node listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, cancelling in-flight mining");
            service.cancel_mining();
        })
        .await?;
    Ok(())
}
