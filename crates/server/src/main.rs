//! roost server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use roost_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().map_err(error::ServerError::from)?;
    tracing::info!(api = %config.api_base_url, offline = config.start_offline, "Starting roost server on stdio transport");

    let state = Arc::new(state::AppState::open(config).await?);
    let handler = handler::RoostServer::new(state.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    state.sync.shutdown();
    tracing::info!("roost server stopped");

    Ok(())
}
