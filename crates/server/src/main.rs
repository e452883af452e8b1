//! swcache server entry point.
//!
//! Loads configuration, brings the cache generation of the running version
//! to `active` and serves the MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{
    FallbackResolver, FetchClient, FetchConfig, Interceptor, LifecycleConfig, LifecycleController, canonicalize,
};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;
use url::Url;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, db = %config.db_path.display(), "Starting swcache server on stdio transport");

    let origin = Url::parse(&config.origin).context("invalid origin")?;
    let offline_url = canonicalize(&config.offline_fallback, &origin).context("invalid offline fallback")?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config)).context("failed to build HTTP client")?);

    let lifecycle = Arc::new(LifecycleController::new(db, LifecycleConfig::from_app_config(&config)?));
    if let Err(e) = lifecycle.run(network.as_ref()).await {
        tracing::warn!(error = %e, "initial install failed, requests pass through until a retry succeeds");
    }

    let interceptor = Arc::new(Interceptor::new(lifecycle, network, FallbackResolver::new(offline_url)));
    let handler = handler::SwcacheServer::new(interceptor.clone(), origin);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    interceptor.flush().await;
    tracing::info!("swcache server stopped");

    Ok(())
}
