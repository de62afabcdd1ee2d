//! Two-hop impersonation: refresh token → user bearer token → IAM credentials API.

use chrono::{DateTime, Utc};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::credentials::RefreshTokenCredential;
use crate::config::settings::UpstreamConfig;
use crate::error::{MetadataError, Result};
use crate::minter::{MintedToken, TokenRequest};

const IAM_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Deserialize)]
struct UserTokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Debug, Serialize)]
struct GenerateAccessTokenRequest<'a> {
    scope: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIdTokenRequest<'a> {
    audience: &'a str,
    include_email: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateIdTokenResponse {
    token: String,
}

pub async fn mint(
    client: &Client,
    upstream: &UpstreamConfig,
    credential: &RefreshTokenCredential,
    service_account_email: &str,
    request: &TokenRequest,
) -> Result<MintedToken> {
    let bearer = user_access_token(client, &upstream.token_endpoint, credential).await?;

    match request {
        TokenRequest::Access { scopes } => {
            let url = iam_url(upstream, service_account_email, "generateAccessToken");
            let body = serde_json::to_vec(&GenerateAccessTokenRequest { scope: scopes })?;
            let data = call_iam(client, &url, &bearer, body, "error generating access token").await?;
            let response: GenerateAccessTokenResponse = serde_json::from_str(&data)?;
            Ok(MintedToken::access(response.access_token, response.expire_time, "Bearer"))
        }
        TokenRequest::Identity { audience } => {
            let url = iam_url(upstream, service_account_email, "generateIdToken");
            let body = serde_json::to_vec(&GenerateIdTokenRequest {
                audience,
                include_email: "false",
            })?;
            let data = call_iam(client, &url, &bearer, body, "error generating id token").await?;
            let response: GenerateIdTokenResponse = serde_json::from_str(&data)?;
            Ok(MintedToken::identity(response.token))
        }
    }
}

/// First hop: trade the stored refresh token for the user's own bearer token.
pub async fn user_access_token(
    client: &Client,
    token_endpoint: &str,
    credential: &RefreshTokenCredential,
) -> Result<String> {
    let form = [
        ("grant_type", "refresh_token"),
        ("client_id", credential.client_id.as_str()),
        ("client_secret", credential.client_secret.as_str()),
        ("refresh_token", credential.refresh_token.as_str()),
    ];

    debug!("refreshing user access token at {}", token_endpoint);
    let response = client.post(token_endpoint).form(&form).send().await?;
    let status = response.status();
    let data = response.text().await?;

    if status != StatusCode::OK {
        return Err(MetadataError::upstream("error generating user access token", status));
    }

    let token: UserTokenResponse = serde_json::from_str(&data)?;
    Ok(token.access_token)
}

async fn call_iam(
    client: &Client,
    url: &str,
    bearer: &str,
    body: Vec<u8>,
    context: &'static str,
) -> Result<String> {
    debug!("calling {}", url);
    let response = client
        .post(url)
        .header(CONTENT_TYPE, IAM_CONTENT_TYPE)
        .header(AUTHORIZATION, format!("Bearer {}", bearer))
        .body(body)
        .send()
        .await?;
    let status = response.status();
    let data = response.text().await?;

    if status != StatusCode::OK {
        return Err(MetadataError::upstream(context, status));
    }
    Ok(data)
}

fn iam_url(upstream: &UpstreamConfig, email: &str, method: &str) -> String {
    format!("{}/{}:{}", upstream.iam_credentials_endpoint, email, method)
}
