// Credential snapshots used to sign service requests
use std::fmt;
use std::sync::Arc;

use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::infrastructure::config::{AuthType, DatasourceSettings};
use crate::infrastructure::edge_auth::EdgeAuthenticator;

pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.filter(|t| !t.is_empty()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where request credentials come from.
#[derive(Clone)]
pub enum CredentialSource {
    Static(Credentials),
    Edge(Arc<EdgeAuthenticator>),
}

impl CredentialSource {
    pub fn from_settings(settings: &DatasourceSettings) -> ApiResult<Self> {
        if settings.is_edge() {
            return Ok(CredentialSource::Edge(Arc::new(EdgeAuthenticator::from_settings(
                settings,
            )?)));
        }
        match settings.auth_type {
            AuthType::Keys => {
                let (Some(access_key), Some(secret_key)) =
                    (settings.access_key.as_deref(), settings.secret_key.as_deref())
                else {
                    return Err(ApiError::Configuration(
                        "access key and secret key are required".into(),
                    ));
                };
                Ok(CredentialSource::Static(Credentials::new(
                    access_key,
                    secret_key,
                    settings.session_token.clone(),
                )))
            }
            AuthType::Default => {
                let access_key = std::env::var(ACCESS_KEY_ENV).map_err(|_| {
                    ApiError::Configuration(format!("{ACCESS_KEY_ENV} is not set"))
                })?;
                let secret_key = std::env::var(SECRET_KEY_ENV).map_err(|_| {
                    ApiError::Configuration(format!("{SECRET_KEY_ENV} is not set"))
                })?;
                Ok(CredentialSource::Static(Credentials::new(
                    access_key,
                    secret_key,
                    std::env::var(SESSION_TOKEN_ENV).ok(),
                )))
            }
            AuthType::Profile | AuthType::AssumeRole => Err(ApiError::Configuration(format!(
                "auth type {:?} is not supported by this service",
                settings.auth_type
            ))),
        }
    }

    /// Copy of the current credentials. Edge credentials are refreshed first
    /// when their session has expired.
    pub async fn credentials(&self) -> ApiResult<Credentials> {
        match self {
            CredentialSource::Static(credentials) => Ok(credentials.clone()),
            CredentialSource::Edge(edge) => edge.credentials().await,
        }
    }
}
