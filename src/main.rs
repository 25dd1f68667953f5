// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use document_vault::{
    api::router,
    config::{Config, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    state::AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => tracing_subscriber::fmt().json().with_env_filter(filter()).init(),
        _ => tracing_subscriber::fmt().pretty().with_env_filter(filter()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    tracing::info!("Document Vault v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let addr = config.bind_address();
    let state = AppState::from_config(config)?;
    if state.admin_token.is_none() {
        tracing::warn!("PROXY_ADMIN_TOKEN not set, running in development mode");
    }

    let app = router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Whitelist proxy listening on http://{addr} (docs at /docs)");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
