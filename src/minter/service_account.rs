//! JWT-bearer flow: a self-signed assertion exchanged at the key's token endpoint.

use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::credentials::ServiceAccountKey;
use crate::error::{MetadataError, Result};
use crate::helpers::time::{now, now_i64};
use crate::minter::signer::{AssertionClaims, SignedAssertionSigner};
use crate::minter::{MintedToken, TokenRequest};
use crate::utils::constants::JWT_BEARER_GRANT_TYPE;

#[derive(Debug, Default, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    id_token: String,
}

pub async fn mint(
    client: &Client,
    signer: &dyn SignedAssertionSigner,
    key: &ServiceAccountKey,
    default_token_endpoint: &str,
    request: &TokenRequest,
) -> Result<MintedToken> {
    let token_url = if key.token_url.is_empty() {
        default_token_endpoint
    } else {
        key.token_url.as_str()
    };

    let claims = AssertionClaims::new(&key.client_email, token_url, now_i64(), request);
    let assertion = signer.sign(key, &claims)?;

    debug!("exchanging assertion for {} at {}", request.kind(), token_url);
    let form = [("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.as_str())];
    let response = client.post(token_url).form(&form).send().await?;
    let status = response.status();
    let data = response.text().await?;

    if status != StatusCode::OK {
        let context = match request {
            TokenRequest::Access { .. } => "error generating access token",
            TokenRequest::Identity { .. } => "error generating id token",
        };
        return Err(MetadataError::upstream(context, status));
    }

    let token: TokenEndpointResponse = serde_json::from_str(&data)?;
    match request {
        TokenRequest::Access { .. } => {
            if token.access_token.is_empty() {
                return Err(MetadataError::MissingToken("access_token"));
            }
            let token_type = if token.token_type.is_empty() {
                "Bearer".to_owned()
            } else {
                token.token_type
            };
            let expires_at = Duration::try_seconds(token.expires_in)
                .and_then(|lifetime| now().checked_add_signed(lifetime))
                .ok_or(MetadataError::InvalidExpiry(token.expires_in))?;
            Ok(MintedToken::access(token.access_token, expires_at, token_type))
        }
        TokenRequest::Identity { .. } => {
            if token.id_token.is_empty() {
                return Err(MetadataError::MissingToken("id_token"));
            }
            Ok(MintedToken::identity(token.id_token))
        }
    }
}
