//! Error taxonomy shared by the loaders, the token minter and the router.

use thiserror::Error;

pub type Result<T, E = MetadataError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// Startup input is missing, unreadable or inconsistent.
    #[error("{0}")]
    Config(String),

    /// Upstream answered with a non-200 status.
    #[error("{context}: {status}")]
    Upstream { context: &'static str, status: u16 },

    /// Upstream answered 200 without the token we asked for.
    #[error("upstream response has no {0}")]
    MissingToken(&'static str),

    /// Upstream `expires_in` does not fit in a timestamp.
    #[error("upstream response has out of range expires_in: {0}")]
    InvalidExpiry(i64),

    /// Connection, TLS or body read failure while talking to upstream.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Key material could not be parsed or the assertion could not be signed.
    #[error("unable to sign assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl MetadataError {
    pub fn config(message: impl Into<String>) -> Self {
        MetadataError::Config(message.into())
    }

    pub fn upstream(context: &'static str, status: reqwest::StatusCode) -> Self {
        MetadataError::Upstream { context, status: status.as_u16() }
    }
}
