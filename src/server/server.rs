use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::settings::ServiceConfig;
use crate::config::{credentials, metadata, resolve_service_account_email};
use crate::minter::TokenMinter;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::router::{router, AppState};

impl AppState {
    /// Load metadata and credentials once. Any failure here aborts startup.
    pub fn from_config(config: &ServiceConfig, client: Client) -> Result<Self> {
        let snapshot = metadata::load(&config.metadata_path)
            .with_context(|| format!("failed to load metadata from {}", config.metadata_path.display()))?;

        let source = credentials::load(&config.credentials_path).with_context(|| {
            format!("failed to load credentials from {}", config.credentials_path.display())
        })?;

        let email = resolve_service_account_email(config.service_account_email.as_deref(), &source)?;
        info!("Impersonating {} using {} credentials", email, source.kind());

        let minter = TokenMinter::new(client, Arc::new(source), email, config.upstream.clone());
        Ok(AppState::new(snapshot, minter))
    }
}

/// Serve the metadata endpoints until the shutdown signal fires.
pub async fn start(config: &ServiceConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(&config.server.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    info!("Listening on {}", listener.local_addr()?);

    metrics.up.set(1);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    metrics.up.set(0);

    info!("metadata server stopped");
    Ok(())
}

/// Serve `/metrics` on a separate address when one is configured.
pub async fn start_metrics(address: Option<String>) -> Result<()> {
    let Some(address) = address else {
        return Ok(());
    };
    let metrics = get_metrics().await;
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind metrics address {}", address))?;
    info!("Serving metrics on {}", address);

    axum::serve(listener, MetricsState::new(metrics.registry.clone()).router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available: run until the task is dropped.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
