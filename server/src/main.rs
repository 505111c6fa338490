use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::app::ArenaServer;
use server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let server = ArenaServer::start(config).await?;
    info!("Listening on http://{}", server.addr());

    info!("Server started. Waiting for shutdown signal (Ctrl+C)...");
    tokio::signal::ctrl_c().await?;

    info!("Received shutdown signal. Shutting down gracefully...");
    server.shutdown().await?;
    Ok(())
}
