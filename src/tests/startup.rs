// Startup wiring: files on disk -> ServiceConfig -> AppState -> served router.

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use anyhow::Result;
    use http::StatusCode;

    use crate::config::settings::{
        LoggingConfig, MetricsConfig, ServerConfig, ServiceConfig, UpstreamConfig,
    };
    use crate::server::router::{router, AppState};
    use crate::server::server;
    use crate::tests::common::{build_reqwest_client, get_metadata, spawn_axum, write_temp_file};

    const AUTHORIZED_USER: &str = r#"{
        "client_id": "client-1",
        "client_secret": "secret-1",
        "refresh_token": "refresh-1",
        "quota_project_id": "demo",
        "type": "authorized_user"
    }"#;

    const SERVICE_ACCOUNT: &str = r#"{
        "type": "service_account",
        "client_email": "key-robot@demo.iam.gserviceaccount.com",
        "private_key_id": "kid-1",
        "private_key": "unchecked until first mint",
        "token_uri": "https://oauth2.googleapis.com/token",
        "project_id": "demo"
    }"#;

    fn config(metadata: PathBuf, credentials: PathBuf, email: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            server: ServerConfig {
                listen_address: "127.0.0.1:0".into(),
            },
            metadata_path: metadata,
            credentials_path: credentials,
            service_account_email: email.map(str::to_owned),
            upstream: UpstreamConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[tokio::test]
    async fn generated_instance_id_is_stable_across_requests() -> Result<()> {
        let metadata = write_temp_file(
            r#"{"instance": {"region": "us-central1"}, "project": {"numeric_project_id": "123", "project_id": "demo"}}"#,
        );
        let credentials = write_temp_file(AUTHORIZED_USER);
        let cfg = config(
            metadata.path().to_path_buf(),
            credentials.path().to_path_buf(),
            Some("robot@demo.iam.gserviceaccount.com"),
        );

        let state = AppState::from_config(&cfg, build_reqwest_client())?;
        let (handle, addr) = spawn_axum(router(state)).await;

        let first = get_metadata(addr, "/computeMetadata/v1/instance/id").await.text().await?;
        let second = get_metadata(addr, "/computeMetadata/v1/instance/id").await.text().await?;
        assert_eq!(first.len(), 128);
        assert!(first.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(first, second);

        let email = get_metadata(addr, "/computeMetadata/v1/instance/service-accounts/default/email")
            .await
            .text()
            .await?;
        assert_eq!(email, "robot@demo.iam.gserviceaccount.com");

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn service_account_key_supplies_default_email() -> Result<()> {
        let metadata = write_temp_file(r#"{"instance": {"id": "i", "region": "r"}, "project": {}}"#);
        let credentials = write_temp_file(SERVICE_ACCOUNT);
        let cfg = config(metadata.path().to_path_buf(), credentials.path().to_path_buf(), None);

        let state = AppState::from_config(&cfg, build_reqwest_client())?;
        assert_eq!(
            state.minter.service_account_email(),
            "key-robot@demo.iam.gserviceaccount.com"
        );
        Ok(())
    }

    #[tokio::test]
    async fn untyped_credentials_start_in_refresh_token_mode() -> Result<()> {
        let metadata = write_temp_file(r#"{"instance": {"id": "i", "region": "r"}, "project": {}}"#);
        let credentials =
            write_temp_file(r#"{"client_id": "c", "client_secret": "s", "refresh_token": "r"}"#);

        let cfg = config(
            metadata.path().to_path_buf(),
            credentials.path().to_path_buf(),
            Some("robot@demo.iam.gserviceaccount.com"),
        );
        let state = AppState::from_config(&cfg, build_reqwest_client())?;
        assert_eq!(state.minter.service_account_email(), "robot@demo.iam.gserviceaccount.com");

        let cfg = config(metadata.path().to_path_buf(), credentials.path().to_path_buf(), None);
        assert!(AppState::from_config(&cfg, build_reqwest_client()).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn startup_fails_on_bad_inputs() {
        let metadata = write_temp_file(r#"{"instance": {"id": "i"}}"#);
        let credentials = write_temp_file(AUTHORIZED_USER);

        // refresh-token credentials without a target account
        let cfg = config(metadata.path().to_path_buf(), credentials.path().to_path_buf(), None);
        assert!(AppState::from_config(&cfg, build_reqwest_client()).is_err());

        // unreadable metadata file
        let cfg = config(
            PathBuf::from("/missing/metadata.json"),
            credentials.path().to_path_buf(),
            Some("robot@demo.iam.gserviceaccount.com"),
        );
        let err = AppState::from_config(&cfg, build_reqwest_client()).err().unwrap();
        assert!(err.to_string().contains("failed to load metadata"));

        // malformed credential file
        let broken = write_temp_file("{");
        let cfg = config(
            metadata.path().to_path_buf(),
            broken.path().to_path_buf(),
            Some("robot@demo.iam.gserviceaccount.com"),
        );
        let err = AppState::from_config(&cfg, build_reqwest_client()).err().unwrap();
        assert!(err.to_string().contains("failed to load credentials"));
    }

    #[tokio::test]
    async fn serve_answers_on_bound_listener() -> Result<()> {
        let metadata = write_temp_file(
            r#"{"instance": {"id": "i-1", "region": "us-east1"}, "project": {"numeric_project_id": "9", "project_id": "p"}}"#,
        );
        let credentials = write_temp_file(AUTHORIZED_USER);
        let cfg = config(
            metadata.path().to_path_buf(),
            credentials.path().to_path_buf(),
            Some("robot@demo.iam.gserviceaccount.com"),
        );
        let state = AppState::from_config(&cfg, build_reqwest_client())?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(server::serve(listener, state));

        let response = get_metadata(addr, "/computeMetadata/v1/instance/zone").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await?, "projects/9/zones/us-east1-1");

        handle.abort();
        Ok(())
    }
}
