use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Router metrics
    pub requests: IntCounterVec,

    // Minter metrics
    pub mint_requests: IntCounterVec,
    pub mint_failures: IntCounterVec,
    pub mint_duration: HistogramVec,

    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("metadataserver".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            requests: IntCounterVec::new(Opts::new("requests_total", "Metadata requests by path and status"), &["path", "status"]).unwrap(),

            mint_requests: IntCounterVec::new(Opts::new("mint_requests_total", "Token mint attempts by kind"), &["kind", "credential"]).unwrap(),
            mint_failures: IntCounterVec::new(Opts::new("mint_failures_total", "Token mint failures by kind"), &["kind", "reason"]).unwrap(),
            mint_duration: HistogramVec::new(HistogramOpts::new("mint_duration_seconds", "Token mint duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["kind"]).unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.requests.clone())).unwrap();
        reg.register(Box::new(metrics.mint_requests.clone())).unwrap();
        reg.register(Box::new(metrics.mint_failures.clone())).unwrap();
        reg.register(Box::new(metrics.mint_duration.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
