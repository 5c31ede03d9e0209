use crate::error::{BetfairError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_LOGIN_URL: &str = "https://identitysso-cert.betfair.com/api/certlogin";
pub const DEFAULT_API_URL: &str = "https://api.betfair.com/exchange/betting/json-rpc/v1";
pub const DEFAULT_ROOT_CA_PATH: &str = "certs/rootca.pem";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable that supplies (or overrides) the application key.
pub const APP_KEY_ENV: &str = "BETFAIR_APP_KEY";

#[derive(Clone, Deserialize)]
pub struct BetfairConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub api_key: String,
    pub cert_path: String,
    pub key_path: String,
    #[serde(default)]
    pub root_ca_path: Option<String>,
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for BetfairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BetfairConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<set>" })
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("root_ca_path", &self.root_ca_path)
            .field("login_url", &self.login_url)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Immutable client configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub betfair: BetfairConfig,
}

impl Config {
    /// Load `config.toml` from the working directory and apply `BETFAIR_APP_KEY`.
    pub fn new() -> Result<Self> {
        let mut config = Self::from_path("config.toml")?;
        config.apply_env();
        info!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|e| {
            BetfairError::Config(format!("unable to read {}: {e}", path.display()))
        })?;
        config_str.parse()
    }

    /// Replace the application key with `BETFAIR_APP_KEY` when it is set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_app_key(std::env::var(APP_KEY_ENV).ok());
    }

    pub fn apply_app_key(&mut self, app_key: Option<String>) {
        if let Some(key) = app_key.filter(|k| !k.trim().is_empty()) {
            self.betfair.api_key = key;
        }
    }

    /// Fails when no application key is available.
    pub fn validate(&self) -> Result<()> {
        if self.betfair.api_key.trim().is_empty() {
            return Err(BetfairError::MissingAppKey);
        }
        Ok(())
    }

    pub fn login_url(&self) -> &str {
        self.betfair.login_url.as_deref().unwrap_or(DEFAULT_LOGIN_URL)
    }

    pub fn api_url(&self) -> &str {
        self.betfair.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Configured trust root, or the bundled default when none was given.
    pub fn root_ca_path(&self) -> &str {
        self.betfair
            .root_ca_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_ROOT_CA_PATH)
    }

    pub fn timeout(&self) -> Duration {
        self.betfair
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl FromStr for Config {
    type Err = BetfairError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BetfairError::Config(e.to_string()))
    }
}
