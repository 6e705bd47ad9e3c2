//! Order Relay web server.
//!
//! Receives Shopify order webhooks, verifies their HMAC signature and
//! forwards a summary of each new order to a Telegram chat.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_relay::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("order_relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        deploy_env = %config.deploy_env,
        shopify_secret_configured = config.shopify_webhook_secret.is_some(),
        telegram_token_configured = config.telegram_bot_token.is_some(),
        telegram_chat_configured = config.telegram_chat_id.is_some(),
        webhook_paths = ?config.webhook_paths,
        "config_loaded"
    );

    let port = config.port;
    let state = AppState::new(config).context("Failed to build application state")?;
    info!(verification = state.verifier.mode(), "signature_verifier_selected");

    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "order_relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("order_relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("order_relay_shutting_down");
}
