//! Command-line interface parsing for tcache.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid override '{0}': expected KEY=VALUE")]
    InvalidOverride(String),
}

/// tcache - HTTP response cache and app-startup bootstrap
#[derive(Parser, Debug)]
#[command(name = "tcache")]
#[command(about = "HTTP response cache and app-startup bootstrap")]
#[command(version)]
pub struct Cli {
    /// TOML config file (overrides TCACHE_CONFIG_FILE)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check connectivity, open a server session if online, then log in
    Startup {
        /// Override a startup setting, e.g. --set session_timeout_ms=5000
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },

    /// Inspect or modify the response cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Print the cache key for a request
    Fingerprint {
        method: String,
        url: String,
        /// Serialized request parameters or body
        #[arg(long, default_value = "")]
        params: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Read an entry
    Get {
        hash: String,
        /// Return the entry even if it has expired
        #[arg(long)]
        bypass_expiration: bool,
    },

    /// Write an entry, replacing any existing one
    Set {
        hash: String,
        content: String,
        /// Content kind; "json" makes reads return parsed JSON
        #[arg(long)]
        mime: Option<String>,
        /// Seconds until expiry (defaults to http.cache.default_ttl_secs)
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<i64>,
    },

    /// Delete an entry
    Del { hash: String },

    /// Delete every entry
    Reset,

    /// Delete entries that have already expired
    PurgeExpired,
}

/// Turn `KEY=VALUE` pairs into an override object.
///
/// Values that parse as JSON keep their type (`500`, `true`, `null`);
/// anything else is taken as a string. Later pairs win.
pub fn parse_overrides(pairs: &[String]) -> Result<Map<String, Value>, CliError> {
    let mut overrides = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| CliError::InvalidOverride(pair.clone()))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        overrides.insert(key.trim().to_string(), value);
    }
    Ok(overrides)
}
