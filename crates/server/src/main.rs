//! gymgurus-sw server entry point.
//!
//! Boots the offline cache coordinator and serves it as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use gymgurus_client::{Coordinator, CoordinatorSettings, FetchClient, FetchConfig};
use gymgurus_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
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

    let config = AppConfig::load()?;
    tracing::info!(
        "Starting gymgurus-sw for {} (generation {}, db {})",
        config.origin,
        config.cache_version,
        config.db_path.display()
    );

    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from_app_config(&config))?;
    let settings = CoordinatorSettings::from_app_config(&config)?;
    let coordinator = Coordinator::new(settings, Arc::new(cache.clone()), Arc::new(fetcher))?;

    let handler = handler::GymGurusServer::new(Arc::new(coordinator), cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
