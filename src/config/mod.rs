pub mod cli;
pub mod credentials;
pub mod metadata;
pub mod settings;

use crate::config::credentials::CredentialSource;
use crate::error::{MetadataError, Result};

/// Email served on the `email` path and used as the impersonation target.
/// A service-account key may stand in for a missing flag; refresh-token
/// credentials have nothing to fall back on.
pub fn resolve_service_account_email(
    configured: Option<&str>,
    source: &CredentialSource,
) -> Result<String> {
    if let Some(email) = configured.filter(|email| !email.is_empty()) {
        return Ok(email.to_owned());
    }
    match source {
        CredentialSource::ServiceAccountKey(key) if !key.client_email.is_empty() => {
            Ok(key.client_email.clone())
        }
        CredentialSource::ServiceAccountKey(_) => Err(MetadataError::config(
            "service account key has no client_email and --service-account is not set",
        )),
        CredentialSource::RefreshToken(_) => Err(MetadataError::config(
            "--service-account is required when impersonating with user credentials",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::{RefreshTokenCredential, ServiceAccountKey};

    #[test]
    fn configured_email_wins() {
        let source = CredentialSource::ServiceAccountKey(ServiceAccountKey {
            client_email: "key@demo.iam.gserviceaccount.com".into(),
            ..Default::default()
        });
        let email = resolve_service_account_email(Some("flag@demo.iam.gserviceaccount.com"), &source);
        assert_eq!(email.unwrap(), "flag@demo.iam.gserviceaccount.com");
    }

    #[test]
    fn service_account_key_falls_back_to_client_email() {
        let source = CredentialSource::ServiceAccountKey(ServiceAccountKey {
            client_email: "key@demo.iam.gserviceaccount.com".into(),
            ..Default::default()
        });
        let email = resolve_service_account_email(None, &source).unwrap();
        assert_eq!(email, "key@demo.iam.gserviceaccount.com");
    }

    #[test]
    fn refresh_token_requires_target_email() {
        let source = CredentialSource::RefreshToken(RefreshTokenCredential::default());
        let err = resolve_service_account_email(Some(""), &source).unwrap_err();
        assert!(matches!(err, MetadataError::Config(_)));
    }
}
