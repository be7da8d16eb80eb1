use std::sync::Arc;

use anyhow::Context;
use chainsign_core::{logging, Config};
use chainsign_node::{app, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    logging::init_from_config(&config.logging);

    let state = Arc::new(AppState::from_config(&config)?);
    let router = app(state, config.server.cors_enabled);

    let listener = TcpListener::bind(&config.server.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
    info!(
        address = %config.server.listen_address,
        cors_enabled = config.server.cors_enabled,
        rsa_bits = config.keys.rsa_bits,
        "chainsign-node listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("chainsign-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
