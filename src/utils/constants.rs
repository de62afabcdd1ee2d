//! Shared constants and invariants

pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

// Upstream endpoints
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_IAM_CREDENTIALS_ENDPOINT: &str =
    "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts";

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

// Credential file `type` values
pub const CREDENTIAL_TYPE_AUTHORIZED_USER: &str = "authorized_user";
pub const CREDENTIAL_TYPE_SERVICE_ACCOUNT: &str = "service_account";

// Metadata protocol headers
pub const METADATA_FLAVOR_HEADER: &str = "metadata-flavor";
pub const METADATA_FLAVOR_VALUE: &str = "Google";
pub const SERVER_HEADER_VALUE: &str = "Metadata Server for Serverless";

pub const CONTENT_TYPE_TEXT: &str = "application/text";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_PLAIN: &str = "text/plain; charset=utf-8";

pub const DEFAULT_SERVICE_ACCOUNT_ALIAS: &str = "default";

// Metadata paths
pub const PATH_INSTANCE_ID: &str = "/computeMetadata/v1/instance/id";
pub const PATH_INSTANCE_REGION: &str = "/computeMetadata/v1/instance/region";
pub const PATH_INSTANCE_ZONE: &str = "/computeMetadata/v1/instance/zone";
pub const PATH_SA_ALIASES: &str = "/computeMetadata/v1/instance/service-accounts/default/aliases";
pub const PATH_SA_EMAIL: &str = "/computeMetadata/v1/instance/service-accounts/default/email";
pub const PATH_SA_TOKEN: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
pub const PATH_SA_IDENTITY: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
pub const PATH_NUMERIC_PROJECT_ID: &str = "/computeMetadata/v1/project/numeric-project-id";
pub const PATH_PROJECT_ID: &str = "/computeMetadata/v1/project/project-id";

pub const METRICS_PATH: &str = "/metrics";
