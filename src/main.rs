//! ticketfront server entry point.
//!
//! Starts the storefront context and the Axum HTTP server with REST and
//! WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use ticketfront::api;
use ticketfront::app_state::AppState;
use ticketfront::config::StorefrontConfig;
use ticketfront::context::StorefrontContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = StorefrontConfig::from_env()
        .map_err(anyhow::Error::from_boxed)
        .context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = %config.backend_mode,
        "starting ticketfront"
    );
    if config.uses_default_secret() {
        tracing::warn!("TOKEN_SECRET is not set; using the development secret");
    }

    // Build stores
    let context = Arc::new(
        StorefrontContext::start(&config)
            .await
            .context("failed to start storefront")?,
    );

    // Build router
    let app = api::build_app(AppState::new(Arc::clone(&context)));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    context.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
}
