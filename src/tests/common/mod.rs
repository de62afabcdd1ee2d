// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use tempfile::NamedTempFile;

use crate::config::credentials::CredentialSource;
use crate::config::metadata::{InstanceMetadata, MetadataSnapshot, ProjectMetadata};
use crate::config::settings::UpstreamConfig;
use crate::minter::TokenMinter;
use crate::server::router::{router, AppState};

pub const TEST_KEY: &str = include_str!("../fixtures/test_key.pem");
pub const TARGET_EMAIL: &str = "robot@demo.iam.gserviceaccount.com";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn write_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

pub fn snapshot() -> MetadataSnapshot {
    MetadataSnapshot {
        instance: InstanceMetadata {
            id: "instance-1".into(),
            region: "us-central1".into(),
        },
        project: ProjectMetadata {
            numeric_project_id: "123".into(),
            project_id: "demo".into(),
        },
    }
}

/// Metadata router whose minter talks to `base_url` instead of Google.
pub async fn spawn_metadata_server(
    source: CredentialSource,
    base_url: &str,
) -> (JoinHandle<()>, SocketAddr) {
    let upstream = UpstreamConfig {
        token_endpoint: format!("{}/token", base_url),
        iam_credentials_endpoint: format!("{}/v1/projects/-/serviceAccounts", base_url),
    };
    let minter = TokenMinter::new(
        build_reqwest_client(),
        Arc::new(source),
        TARGET_EMAIL.to_owned(),
        upstream,
    );
    spawn_axum(router(AppState::new(snapshot(), minter))).await
}

/// GET a metadata path with the `Metadata-Flavor: Google` header.
pub async fn get_metadata(addr: SocketAddr, path_and_query: &str) -> reqwest::Response {
    build_reqwest_client()
        .get(format!("http://{}{}", addr, path_and_query))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .expect("metadata request")
}
