use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::credentials::ServiceAccountKey;
use crate::error::Result;
use crate::minter::TokenRequest;
use crate::utils::constants::ASSERTION_LIFETIME_SECS;

/// Claims of the self-signed JWT-bearer assertion sent to the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    /// Set for identity tokens; asks the endpoint for an `id_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl AssertionClaims {
    pub fn new(issuer: &str, token_url: &str, issued_at: i64, request: &TokenRequest) -> Self {
        let (scope, target_audience) = match request {
            TokenRequest::Access { scopes } => {
                let joined = scopes.join(" ");
                (Some(joined).filter(|s| !s.is_empty()), None)
            }
            TokenRequest::Identity { audience } => (None, Some(audience.clone())),
        };

        Self {
            iss: issuer.to_owned(),
            scope,
            aud: token_url.to_owned(),
            exp: issued_at + ASSERTION_LIFETIME_SECS,
            iat: issued_at,
            target_audience,
        }
    }
}

/// Turns assertion claims into a compact signed token using the account key.
pub trait SignedAssertionSigner: Send + Sync {
    fn sign(&self, key: &ServiceAccountKey, claims: &AssertionClaims) -> Result<String>;
}

/// RS256 signer. The PEM is parsed on every call, so broken key material
/// shows up on the first mint rather than at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtAssertionSigner;

impl SignedAssertionSigner for JwtAssertionSigner {
    fn sign(&self, key: &ServiceAccountKey, claims: &AssertionClaims) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        if !key.private_key_id.is_empty() {
            header.kid = Some(key.private_key_id.clone());
        }
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(encode(&header, claims, &encoding_key)?)
    }
}
