//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, StartupConfig};
use thiserror::Error;

/// Longest accepted `http.cache.default_ttl_secs`: ten years.
pub const MAX_DEFAULT_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `http.cache.default_ttl_secs` is not positive or exceeds ten years
    /// - any `startup` value is out of range (see [`StartupConfig::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if self.http.cache.default_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                field: "http.cache.default_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.http.cache.default_ttl_secs > MAX_DEFAULT_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "http.cache.default_ttl_secs".into(),
                reason: format!("must not exceed ten years ({MAX_DEFAULT_TTL_SECS}s)"),
            });
        }

        self.startup.validate()
    }
}

impl StartupConfig {
    /// Validate the startup section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `probe_url` or `server_url` is not an absolute http(s) URL
    /// - `probe_timeout_ms` is less than 100ms or exceeds 1 minute
    /// - `session_timeout_ms` is set below 100ms
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("startup.probe_url", &self.probe_url)?;

        if let Some(server_url) = &self.server_url {
            check_http_url("startup.server_url", server_url)?;
        }

        if self.probe_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "startup.probe_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.probe_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "startup.probe_timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if let Some(ms) = self.session_timeout_ms
            && ms < 100
        {
            return Err(ConfigError::Invalid {
                field: "startup.session_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "startup.user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Invalid { field: field.into(), reason: format!("not a valid URL: {e}") })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid { field: field.into(), reason: format!("unsupported scheme: {other}") }),
    }
}
