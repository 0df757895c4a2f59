// Short-lived credentials from an on-premise SiteWise gateway
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::infrastructure::config::DatasourceSettings;
use crate::infrastructure::credentials::Credentials;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
    auth_mechanism: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResponse {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    session_expiry_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Session {
    credentials: Credentials,
    expires_at: DateTime<Utc>,
}

/// Client for the gateway. The operator PEM is the only trust anchor and the
/// certificate's host name is not checked.
fn gateway_client(pem: &str) -> ApiResult<reqwest::Client> {
    let certificate = reqwest::Certificate::from_pem(pem.as_bytes())
        .map_err(|err| ApiError::Configuration(format!("invalid edge certificate: {err}")))?;
    Ok(reqwest::Client::builder()
        .tls_built_in_root_certs(false)
        .add_root_certificate(certificate)
        .danger_accept_invalid_hostnames(true)
        .build()?)
}

pub struct EdgeAuthenticator {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    mechanism: String,
    session: Mutex<Option<Session>>,
}

impl EdgeAuthenticator {
    pub fn from_settings(settings: &DatasourceSettings) -> ApiResult<Self> {
        settings.validate()?;
        let missing = |name: &str| ApiError::Configuration(format!("edge region requires {name}"));
        let endpoint = settings.endpoint().ok_or_else(|| missing("endpoint"))?;
        let pem = settings.edge_cert.as_deref().ok_or_else(|| missing("edge_cert"))?;

        Ok(Self::with_client(
            gateway_client(pem)?,
            endpoint,
            settings.edge_auth_user.as_deref().unwrap_or_default(),
            settings.edge_auth_pass.as_deref().unwrap_or_default(),
            &settings.edge_auth_mode,
        ))
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoint: &str,
        username: &str,
        password: &str,
        mechanism: &str,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            mechanism: mechanism.to_string(),
            session: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Client trusting the gateway certificate, shared with data requests.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current credentials; an expired or missing session is replaced while
    /// the lock is held so only one refresh runs at a time.
    pub async fn credentials(&self) -> ApiResult<Credentials> {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref() {
            if current.expires_at > Utc::now() {
                return Ok(current.credentials.clone());
            }
            tracing::info!("Edge session expired at {}, re-authenticating", current.expires_at);
        }

        let fresh = self.authenticate().await?;
        let credentials = fresh.credentials.clone();
        *session = Some(fresh);
        Ok(credentials)
    }

    async fn authenticate(&self) -> ApiResult<Session> {
        let url = format!("{}/authenticate", self.endpoint);
        let body = AuthenticateRequest {
            username: &self.username,
            password: &self.password,
            auth_mechanism: &self.mechanism,
        };
        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Service {
                status: status.as_u16(),
                code: "EdgeAuthenticationFailed".into(),
                message,
            });
        }

        let data: AuthenticateResponse = serde_json::from_slice(&response.bytes().await?)?;
        tracing::debug!("Edge session valid until {}", data.session_expiry_time);
        Ok(Session {
            credentials: Credentials::new(
                data.access_key_id,
                data.secret_access_key,
                Some(data.session_token),
            ),
            expires_at: data.session_expiry_time,
        })
    }
}
