use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

use crate::utils::constants::METRICS_PATH;

#[derive(Clone)]
pub struct MetricsState {
    pub registry: Registry,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// `/metrics` lives on its own listener so the metadata path table stays exact.
    pub fn router(&self) -> Router {
        Router::new()
            .route(METRICS_PATH, get(get_metrics))
            .with_state(self.clone())
    }
}

async fn get_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, [(CONTENT_TYPE, "text/plain")], String::new());
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
}
