//! Token minting on behalf of the configured identity.
//!
//! Two protocols, chosen by the [`CredentialSource`] variant:
//! - `service_account`: a self-signed JWT-bearer assertion exchanged directly
//!   at the key's token endpoint
//! - `authorized_user`: the stored refresh token is traded for a user bearer
//!   token, which then calls the IAM credentials API to act as the target
//!   service account
//!
//! Nothing is cached. Every call goes upstream and no call is retried.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::credentials::CredentialSource;
use crate::config::settings::UpstreamConfig;
use crate::error::{MetadataError, Result};
use crate::helpers::time::{get_instant, seconds_until};
use crate::observability::metrics::get_metrics;
use self::signer::{JwtAssertionSigner, SignedAssertionSigner};

pub mod refresh;
pub mod service_account;
pub mod signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Identity,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Identity => "identity",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single metadata request asks the minter for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequest {
    Access { scopes: Vec<String> },
    Identity { audience: String },
}

impl TokenRequest {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenRequest::Access { .. } => TokenKind::Access,
            TokenRequest::Identity { .. } => TokenKind::Identity,
        }
    }
}

/// Scopes arrive comma-joined. They are split but otherwise passed through
/// untouched, so a missing parameter becomes a single empty scope.
pub fn scopes_from_query(scopes: Option<&str>) -> Vec<String> {
    scopes.unwrap_or_default().split(',').map(str::to_owned).collect()
}

/// Result of one successful mint. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedToken {
    pub kind: TokenKind,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub token_type: String,
}

#[derive(Serialize)]
struct AccessTokenResponse<'a> {
    access_token: &'a str,
    expires_in: i64,
    token_type: &'a str,
}

impl MintedToken {
    pub fn access(
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            kind: TokenKind::Access,
            token: token.into(),
            expires_at: Some(expires_at),
            token_type: token_type.into(),
        }
    }

    pub fn identity(token: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Identity,
            token: token.into(),
            expires_at: None,
            token_type: String::new(),
        }
    }

    /// Seconds left, measured when called.
    pub fn expires_in(&self) -> i64 {
        self.expires_at.map(seconds_until).unwrap_or(0)
    }

    /// `{"access_token", "expires_in", "token_type"}` as served on the `token` path.
    pub fn to_access_response(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&AccessTokenResponse {
            access_token: &self.token,
            expires_in: self.expires_in(),
            token_type: &self.token_type,
        })?)
    }

    /// The bare token string served on the `identity` path.
    pub fn into_identity_response(self) -> String {
        self.token
    }
}

#[derive(Clone)]
pub struct TokenMinter {
    client: Client,
    source: Arc<CredentialSource>,
    service_account_email: String,
    upstream: UpstreamConfig,
    signer: Arc<dyn SignedAssertionSigner>,
}

impl TokenMinter {
    pub fn new(
        client: Client,
        source: Arc<CredentialSource>,
        service_account_email: String,
        upstream: UpstreamConfig,
    ) -> Self {
        Self {
            client,
            source,
            service_account_email,
            upstream,
            signer: Arc::new(JwtAssertionSigner),
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn SignedAssertionSigner>) -> Self {
        self.signer = signer;
        self
    }

    pub fn service_account_email(&self) -> &str {
        &self.service_account_email
    }

    pub async fn mint_access(&self, scopes: Vec<String>) -> Result<Vec<u8>> {
        self.mint(&TokenRequest::Access { scopes })
            .await?
            .to_access_response()
    }

    pub async fn mint_identity(&self, audience: &str) -> Result<String> {
        let request = TokenRequest::Identity {
            audience: audience.to_owned(),
        };
        Ok(self.mint(&request).await?.into_identity_response())
    }

    pub async fn mint(&self, request: &TokenRequest) -> Result<MintedToken> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let kind = request.kind().as_str();
        metrics
            .mint_requests
            .with_label_values(&[kind, self.source.kind()])
            .inc();

        let result = match self.source.as_ref() {
            CredentialSource::ServiceAccountKey(key) => {
                service_account::mint(
                    &self.client,
                    self.signer.as_ref(),
                    key,
                    &self.upstream.token_endpoint,
                    request,
                )
                .await
            }
            CredentialSource::RefreshToken(credential) => {
                refresh::mint(
                    &self.client,
                    &self.upstream,
                    credential,
                    &self.service_account_email,
                    request,
                )
                .await
            }
        };

        metrics
            .mint_duration
            .with_label_values(&[kind])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => info!("minted {} token for {}", kind, self.service_account_email),
            Err(e) => {
                error!("{} token mint failed: {}", kind, e);
                metrics
                    .mint_failures
                    .with_label_values(&[kind, failure_reason(e)])
                    .inc();
            }
        }
        result
    }
}

fn failure_reason(err: &MetadataError) -> &'static str {
    match err {
        MetadataError::Upstream { .. } => "upstream",
        MetadataError::MissingToken(_) => "missing_token",
        MetadataError::InvalidExpiry(_) => "invalid_expiry",
        MetadataError::Transport(_) => "transport",
        MetadataError::Serialization(_) | MetadataError::Yaml(_) => "serialization",
        MetadataError::Signing(_) => "signing",
        MetadataError::Config(_) => "config",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn scopes_are_split_on_commas() {
        assert_eq!(scopes_from_query(Some("a,b")), vec!["a", "b"]);
    }

    #[test]
    fn missing_scopes_pass_through_as_single_empty_scope() {
        assert_eq!(scopes_from_query(None), vec![String::new()]);
        assert_eq!(scopes_from_query(Some("")), vec![String::new()]);
    }

    #[test]
    fn malformed_scopes_are_not_sanitized() {
        assert_eq!(scopes_from_query(Some("a,,b,")), vec!["a", "", "b", ""]);
    }

    #[test]
    fn access_response_uses_relative_expiry() {
        let token = MintedToken::access("ya29.token", Utc::now() + Duration::seconds(600), "Bearer");
        let json: serde_json::Value =
            serde_json::from_slice(&token.to_access_response().unwrap()).unwrap();

        assert_eq!(json["access_token"], "ya29.token");
        assert_eq!(json["token_type"], "Bearer");
        let expires_in = json["expires_in"].as_i64().unwrap();
        assert!(expires_in > 595 && expires_in <= 600, "expires_in: {}", expires_in);
    }

    #[test]
    fn expired_token_renders_zero_expiry() {
        let token = MintedToken::access("t", Utc::now() - Duration::seconds(5), "Bearer");
        assert_eq!(token.expires_in(), 0);
    }

    #[test]
    fn identity_response_is_the_bare_token() {
        assert_eq!(MintedToken::identity("eyJ.id.token").into_identity_response(), "eyJ.id.token");
    }
}
