//! safetrack-sw server entry point.
//!
//! Boots the cache controller and serves its lifecycle events as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use safetrack_client::{CacheController, ControllerConfig, HttpNetwork, MemoryShell, NetworkConfig};
use safetrack_core::{CacheDb, WorkerConfig};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        db = %config.db_path.display(),
        "starting safetrack-sw on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(NetworkConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let controller = CacheController::new(ControllerConfig::from_worker_config(&config)?, db, Arc::new(network));

    let handler = handler::SafeTrackServer::new(Arc::new(controller), Arc::new(MemoryShell::new()));
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    Ok(())
}
