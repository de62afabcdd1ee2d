use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::utils::constants::{CREDENTIAL_TYPE_AUTHORIZED_USER, CREDENTIAL_TYPE_SERVICE_ACCOUNT};

/// Identity the minter acts as. Fixed for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    RefreshToken(RefreshTokenCredential),
    ServiceAccountKey(ServiceAccountKey),
}

/// `authorized_user` credentials as written by `gcloud auth application-default login`.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenCredential {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: String,
    #[serde(default, rename = "type")]
    pub credential_type: String,
}

#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default, rename = "token_uri")]
    pub token_url: String,
    #[serde(default)]
    pub project_id: String,
}

impl CredentialSource {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::RefreshToken(_) => CREDENTIAL_TYPE_AUTHORIZED_USER,
            CredentialSource::ServiceAccountKey(_) => CREDENTIAL_TYPE_SERVICE_ACCOUNT,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::RefreshToken(c) => f
                .debug_struct("RefreshToken")
                .field("client_id", &c.client_id)
                .field("quota_project_id", &c.quota_project_id)
                .finish_non_exhaustive(),
            CredentialSource::ServiceAccountKey(k) => f
                .debug_struct("ServiceAccountKey")
                .field("client_email", &k.client_email)
                .field("private_key_id", &k.private_key_id)
                .field("token_url", &k.token_url)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
struct CredentialType {
    #[serde(default, rename = "type")]
    credential_type: String,
}

pub fn load_refresh_credential(path: &Path) -> Result<CredentialSource> {
    let data = read(path, "credentials")?;
    let credential: RefreshTokenCredential = serde_json::from_str(&data)?;
    Ok(CredentialSource::RefreshToken(credential))
}

pub fn load_service_account_key(path: &Path) -> Result<CredentialSource> {
    let data = read(path, "service account")?;
    let key: ServiceAccountKey = serde_json::from_str(&data)?;
    Ok(CredentialSource::ServiceAccountKey(key))
}

/// Pick the loader from the file's `type` field. A file without one is read
/// as a refresh-token credential.
pub fn load(path: &Path) -> Result<CredentialSource> {
    let data = read(path, "credentials")?;
    let CredentialType { credential_type } = serde_json::from_str(&data)?;
    debug!("credential file {} has type '{}'", path.display(), credential_type);

    match credential_type.as_str() {
        "" | CREDENTIAL_TYPE_AUTHORIZED_USER => {
            Ok(CredentialSource::RefreshToken(serde_json::from_str(&data)?))
        }
        CREDENTIAL_TYPE_SERVICE_ACCOUNT => {
            Ok(CredentialSource::ServiceAccountKey(serde_json::from_str(&data)?))
        }
        other => Err(MetadataError::config(format!(
            "unsupported credential type '{}' in {}",
            other,
            path.display()
        ))),
    }
}

/// `$HOME/.config/gcloud/application_default_credentials.json`
pub fn well_known_file() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    Path::new(&home)
        .join(".config")
        .join("gcloud")
        .join("application_default_credentials.json")
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        MetadataError::config(format!("Unable to read {} file {}: {}", what, path.display(), e))
    })
}
