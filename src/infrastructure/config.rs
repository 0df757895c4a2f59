use serde::Deserialize;
use std::time::Duration;

use crate::application::sitewise_client::ApiError;

/// Region name that switches the data source to an on-premise gateway.
pub const EDGE_REGION: &str = "Edge";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub datasource: DatasourceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    Keys,
    #[default]
    Default,
    Profile,
    AssumeRole,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatasourceSettings {
    pub instance_id: Option<String>,
    pub default_region: String,
    pub endpoint: Option<String>,
    pub auth_type: AuthType,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    pub profile: Option<String>,
    pub assume_role_arn: Option<String>,
    pub edge_auth_mode: String,
    pub edge_auth_user: Option<String>,
    pub edge_auth_pass: Option<String>,
    pub edge_cert: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_sweep_secs: u64,
}

impl Default for DatasourceSettings {
    fn default() -> Self {
        Self {
            instance_id: None,
            default_region: "us-east-1".into(),
            endpoint: None,
            auth_type: AuthType::Default,
            access_key: None,
            secret_key: None,
            session_token: None,
            profile: None,
            assume_role_arn: None,
            edge_auth_mode: "linux".into(),
            edge_auth_user: None,
            edge_auth_pass: None,
            edge_cert: None,
            cache_ttl_secs: 300,
            cache_sweep_secs: 600,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl DatasourceSettings {
    pub fn is_edge(&self) -> bool {
        self.default_region == EDGE_REGION
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/'))
            .filter(|e| !e.is_empty())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs.max(1))
    }

    /// Checks the settings that would otherwise only fail on first use.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.default_region.trim().is_empty() {
            return Err(ApiError::Configuration("default region is required".into()));
        }
        if self.is_edge() {
            let missing: Vec<&str> = [
                ("endpoint", &self.endpoint),
                ("edge_auth_user", &self.edge_auth_user),
                ("edge_auth_pass", &self.edge_auth_pass),
                ("edge_cert", &self.edge_cert),
            ]
            .into_iter()
            .filter(|(_, value)| !present(value))
            .map(|(name, _)| name)
            .collect();
            if !missing.is_empty() {
                return Err(ApiError::Configuration(format!(
                    "edge region requires {}",
                    missing.join(", ")
                )));
            }
            return Ok(());
        }
        if self.auth_type == AuthType::Keys && !(present(&self.access_key) && present(&self.secret_key)) {
            return Err(ApiError::Configuration(
                "access key and secret key are required".into(),
            ));
        }
        Ok(())
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/sitewise").required(false))
        .add_source(config::Environment::with_prefix("SITEWISE").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
