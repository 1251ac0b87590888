use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use fridge_gacha::{router, AppState, Config, RecipeProcessor};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Reads .env first, then the process environment
    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(policy = ?config.failure_policy, max_ingredients = config.limits.max_items, "Loaded configuration");

    let processor = RecipeProcessor::from_config(&config).context("failed to build HTTP client")?;
    let state = AppState { processor: Arc::new(processor) };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
