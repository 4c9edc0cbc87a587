//! shellcache server entry point.
//!
//! Loads the worker configuration, opens the cache store and boots the MCP
//! server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchConfig, HttpNetwork};
use shellcache_core::{CacheDb, CacheStorage, Worker, WorkerConfig};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load().context("failed to load configuration")?;
    tracing::info!(generation = %config.cache_name, db = %config.db_path.display(), "Starting shellcache server on stdio transport");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache store at {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let worker = Worker::new(config, CacheStorage::new(db), network)?;

    let handler = handler::ShellCacheServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
