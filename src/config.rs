//! Process-wide configuration.
//!
//! Values are layered: built-in defaults, then `casics.toml` (or the file
//! named by `CASICS_CONFIG`), then `CASICS_*` environment variables.

use crate::error::CasicsError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

pub const CONFIG_ENV: &str = "CASICS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "casics.toml";

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::load() {
    Ok(cfg) => cfg,
    Err(e) => {
        eprintln!("failed to load configuration, using defaults: {e}");
        Config::default()
    }
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: String,
    pub log_file: Option<PathBuf>,
    pub log_console: bool,
    /// SQLite URL of the credential keyring.
    pub keyring_url: String,
    pub keyring_name: String,
    /// Directory holding one SQLite file per opened database.
    pub data_dir: PathBuf,
    pub default_host: String,
    pub default_port: u16,
    pub connect_timeout_ms: u64,
    pub max_connections: u32,
    pub http_timeout_secs: u64,
    pub accounts_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            log_file: None,
            log_console: false,
            keyring_url: "sqlite:casics-keyring.sqlite".to_string(),
            keyring_name: "org.casics.db".to_string(),
            data_dir: PathBuf::from("."),
            default_host: "localhost".to_string(),
            default_port: 27017,
            connect_timeout_ms: 15_000,
            max_connections: 25,
            http_timeout_secs: 10,
            accounts_file: PathBuf::from("config.toml"),
        }
    }
}

impl Config {
    /// Resolve the config file path from `CASICS_CONFIG`, else the default.
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load() -> Result<Self, CasicsError> {
        Self::figment(Self::config_path()).extract::<Config>()?.validated()
    }

    pub fn figment(path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CASICS_").ignore(&["config"]))
    }

    pub fn validate(&self) -> Result<(), CasicsError> {
        if self.keyring_name.trim().is_empty() {
            return Err(CasicsError::InvalidConfig(
                "keyring_name must not be empty".to_string(),
            ));
        }
        if self.default_port == 0 {
            return Err(CasicsError::InvalidConfig(
                "default_port must be non-zero".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.http_timeout_secs == 0 {
            return Err(CasicsError::InvalidConfig(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, CasicsError> {
        self.validate()?;
        Ok(self)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
