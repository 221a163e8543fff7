//! shellcache server entry point.
//!
//! Boots the interception layer as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig};
use shellcache_core::{AppConfig, CacheDb, OfflineWorker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
#[cfg(test)]
mod testing;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let shell = config.shell_config()?;
    let cache = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(OfflineWorker::new(shell, Arc::new(cache.clone()), Arc::new(network)));

    tracing::info!(
        cache = %config.cache_name,
        origin = %config.origin,
        db = %config.db_path.display(),
        "Starting shellcache server on stdio transport"
    );

    let handler = handler::ShellCacheServer::new(worker, cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
