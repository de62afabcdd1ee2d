use anyhow::Result;
use clap::Parser;
use instance_metadata_server::config::cli::Args;
use instance_metadata_server::server::router::AppState;
use instance_metadata_server::server::server;
use instance_metadata_server::utils::logging;
use instance_metadata_server::ServiceConfig;
use reqwest::Client;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read flags / env into an immutable config
    // -------------------------------

    let service_config = ServiceConfig::from(Args::parse());
    logging::init_logging(&service_config.logging);

    info!("Starting Container Instance Metadata Service ...");

    // -------------------------------
    // 2. Load metadata and credentials, build the minter
    // -------------------------------

    let client = Client::new();
    let state = AppState::from_config(&service_config, client)?;

    // -------------------------------
    // 3. Start metadata and metrics listeners
    // -------------------------------

    let http_server = server::start(&service_config, state);
    let metrics_server = server::start_metrics(service_config.metrics.address.clone());
    tokio::try_join!(http_server, metrics_server)?;

    Ok(())
}
