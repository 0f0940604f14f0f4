//! GitHub Webhook Relay - forwards GitHub deliveries to Jenkins.
//!
//! This binary:
//! - Receives GitHub webhooks on the configured path
//! - Verifies the `X-Hub-Signature-256` HMAC when a secret is configured
//! - Forwards the payload to the configured Jenkins URL
//! - Reports downstream reachability on `/health`

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghrelay::{build_router, AppState, Config, Relay};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    info!(
        port = config.incoming_port,
        webhook_path = %config.webhook_path,
        target_url = %config.masked_target_url(),
        signature_verification = config.has_secret(),
        "config_loaded"
    );

    let relay = Relay::new(config.clone()).context("Failed to create relay client")?;
    let state = AppState::new(config.clone(), relay);

    let app = build_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.incoming_port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, webhook_path = %config.webhook_path, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

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

    info!("relay_shutting_down");
}
