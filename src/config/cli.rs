use std::path::PathBuf;

use clap::Parser;

use crate::config::credentials::well_known_file;
use crate::config::settings::{
    LogFormat, LoggingConfig, MetricsConfig, ServerConfig, ServiceConfig, UpstreamConfig,
};
use crate::utils::constants::{
    DEFAULT_IAM_CREDENTIALS_ENDPOINT, DEFAULT_LISTEN_ADDRESS, DEFAULT_METADATA_FILE,
    DEFAULT_TOKEN_ENDPOINT,
};
use crate::utils::logging::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The HTTP listen address
    #[arg(long, env = "LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,
    /// Metadata file path
    #[arg(long, env = "METADATA_FILE", default_value = DEFAULT_METADATA_FILE)]
    pub metadata: PathBuf,
    /// Credentials file path (authorized user or service account key)
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", default_value = "")]
    pub google_application_credentials: String,
    /// The email address of an IAM service account
    #[arg(long, env = "SERVICE_ACCOUNT", default_value = "")]
    pub service_account: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
    /// Serve prometheus metrics on this address
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
    #[arg(long, env = "TOKEN_ENDPOINT", default_value = DEFAULT_TOKEN_ENDPOINT, hide = true)]
    pub token_endpoint: String,
    #[arg(long, env = "IAM_CREDENTIALS_ENDPOINT", default_value = DEFAULT_IAM_CREDENTIALS_ENDPOINT, hide = true)]
    pub iam_credentials_endpoint: String,
}

impl From<Args> for ServiceConfig {
    fn from(args: Args) -> Self {
        let credentials_path = if args.google_application_credentials.is_empty() {
            well_known_file()
        } else {
            PathBuf::from(args.google_application_credentials)
        };

        let service_account_email = Some(args.service_account).filter(|email| !email.is_empty());

        let logging = LoggingConfig::new(
            args.log_level
                .map(|level| level.as_str().to_owned())
                .unwrap_or_else(|| "info".to_owned()),
            args.log_format.unwrap_or_else(LogFormat::from_env),
        );

        ServiceConfig {
            server: ServerConfig {
                listen_address: args.listen_address,
            },
            metadata_path: args.metadata,
            credentials_path,
            service_account_email,
            upstream: UpstreamConfig {
                token_endpoint: args.token_endpoint,
                iam_credentials_endpoint: args.iam_credentials_endpoint,
            },
            metrics: MetricsConfig {
                address: args.metrics_address,
            },
            logging,
        }
    }
}
