use std::path::PathBuf;

use serde::Deserialize;

use crate::utils::constants::{DEFAULT_IAM_CREDENTIALS_ENDPOINT, DEFAULT_TOKEN_ENDPOINT};

/// ================================
/// Service-wide settings, built once at startup
/// ================================
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub metadata_path: PathBuf,
    pub credentials_path: PathBuf,
    /// Account to impersonate. Falls back to the key's `client_email`
    /// when a service-account key is configured.
    pub service_account_email: Option<String>,
    pub upstream: UpstreamConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// OAuth2 token endpoint used by the refresh-token hop
    pub token_endpoint: String,
    /// IAM credentials `serviceAccounts` collection URL
    pub iam_credentials_endpoint: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_owned(),
            iam_credentials_endpoint: DEFAULT_IAM_CREDENTIALS_ENDPOINT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Separate listener for `/metrics`; disabled when absent.
    pub address: Option<String>,
}

impl MetricsConfig {
    pub fn is_enabled(&self) -> bool {
        self.address.is_some()
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn log_format_reads_env() {
        std::env::set_var("LOG_FORMAT", "JSON");
        assert_eq!(LogFormat::from_env(), LogFormat::Json);
        std::env::set_var("LOG_FORMAT", "text");
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);
        std::env::remove_var("LOG_FORMAT");
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);
    }

    #[test]
    fn upstream_defaults_point_at_google() {
        let upstream = UpstreamConfig::default();
        assert_eq!(upstream.token_endpoint, "https://oauth2.googleapis.com/token");
        assert!(upstream.iam_credentials_endpoint.ends_with("/projects/-/serviceAccounts"));
    }
}
