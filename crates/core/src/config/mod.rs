//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TCACHE_*, nested keys split on `__`)
//! 2. TOML config file (explicit path, or TCACHE_CONFIG_FILE)
//! 3. Built-in defaults
//!
//! Values are immutable once loaded. The startup section can be re-derived
//! with caller overrides through [`StartupConfig::with_overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TCACHE_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via TCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// HTTP settings (`[http]` table).
    #[serde(default)]
    pub http: HttpConfig,

    /// Startup dispatcher settings (`[startup]` table).
    #[serde(default)]
    pub startup: StartupConfig,
}

/// The `http` namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// Response cache settings (`[http.cache]` table).
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Response cache settings.
///
/// The cache carries this value and hands it back through
/// `HttpCache::config`; it does not change lookup behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// TTL used when a caller asks for a default expiry.
    ///
    /// Set via TCACHE_HTTP__CACHE__DEFAULT_TTL_SECS.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: i64,
}

/// Startup dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartupConfig {
    /// URL requested with HEAD to decide whether the device is online.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Server endpoint used to open a session when online.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Timeout for the connectivity check in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Upper bound for the session call. Unset waits indefinitely.
    #[serde(default)]
    pub session_timeout_ms: Option<u64>,

    /// User-Agent string for connectivity and session requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tcache.sqlite")
}

fn default_ttl_secs() -> i64 {
    3600
}

fn default_probe_url() -> String {
    "https://clients3.google.com/generate_204".into()
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "tcache/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { db_path: default_db_path(), http: HttpConfig::default(), startup: StartupConfig::default() }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { default_ttl_secs: default_ttl_secs() }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            server_url: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            session_timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TCACHE_`
    /// 2. TOML file from `TCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("TCACHE_CONFIG_FILE").ok().map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Same as [`AppConfig::load`] but with an explicit TOML file.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("TCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

impl StartupConfig {
    /// Connectivity check timeout as Duration for use with reqwest.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Session timeout as Duration, if one is configured.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_ms.map(Duration::from_millis)
    }

    /// Derive a new config with caller overrides applied on top.
    ///
    /// Keys in `overrides` replace the current values; keys not named are
    /// kept. Only the shape of the merged value is checked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadFailed` if an override has the wrong type.
    pub fn with_overrides<T: Serialize>(&self, overrides: &T) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(self))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))
    }
}
