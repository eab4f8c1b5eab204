use std::{env, fs, time::Duration};

use amt_client::{ClientSettings, Credentials, MessageDefaults};
use anyhow::{bail, Context};
use serde::Deserialize;

const DEFAULT_DISPLAY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub http_bind_addr: String,
    pub auth_bearer_token: Option<String>,
    pub display_capacity: Option<usize>,
}

impl ServerConfig {
    pub fn display_capacity(&self) -> usize {
        self.display_capacity.unwrap_or(DEFAULT_DISPLAY_CAPACITY)
    }
}

#[derive(Clone, Deserialize)]
pub struct AssetStatisticConfig {
    pub endpoint_url: String,
    pub namespace: String,
    pub soap_action: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl std::fmt::Debug for AssetStatisticConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStatisticConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("namespace", &self.namespace)
            .field("soap_action", &self.soap_action)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub asset_statistic: AssetStatisticConfig,
    #[serde(default)]
    pub message_defaults: MessageDefaults,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("FULFILLMENT_CONFIG").unwrap_or_else(|_| "fulfillment-config.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("reading config file {path}"))?;
        let mut cfg = Self::from_toml(&contents)?;

        // Credentials from the environment win over the file.
        if let Ok(username) = env::var("AMT_USERNAME") {
            cfg.asset_statistic.username = Some(username);
        }
        if let Ok(password) = env::var("AMT_PASSWORD") {
            cfg.asset_statistic.password = Some(password);
        }

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Client settings for the asset statistic service. Fails when either
    /// credential is missing or empty.
    pub fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        let svc = &self.asset_statistic;
        let (Some(username), Some(password)) = (svc.username.as_deref(), svc.password.as_deref()) else {
            bail!("asset_statistic credentials missing: set username/password in config or AMT_USERNAME/AMT_PASSWORD");
        };
        if username.is_empty() || password.is_empty() {
            bail!("asset_statistic credentials must not be empty");
        }

        Ok(ClientSettings {
            endpoint_url: svc.endpoint_url.clone(),
            namespace: svc.namespace.clone(),
            soap_action: svc.soap_action.clone(),
            credentials: Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
            timeout: svc.timeout_ms.map(Duration::from_millis),
        })
    }
}
