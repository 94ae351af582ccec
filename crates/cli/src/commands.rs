//! Command implementations.
//!
//! Each command returns an [`Output`] instead of printing so the binary
//! decides where text goes and which exit code to use.

use anyhow::{Context, Result};
use tcache_client::{Authenticator, HttpNetwork, StartupDispatcher, StartupOutcome};
use tcache_core::cache::compute_fingerprint;
use tcache_core::{CacheInfo, HttpCache, Lookup, StartupConfig};

use crate::cli::{CacheCommand, parse_overrides};

/// Text for stdout plus whether the command achieved what was asked.
#[derive(Debug, PartialEq, Eq)]
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), success: true }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self { text: text.into(), success: false }
    }
}

/// Login hand-off for the command line: there is no UI to show, so the
/// hand-off is recorded in the log.
pub struct LogAuthenticator;

#[async_trait::async_trait]
impl Authenticator for LogAuthenticator {
    async fn handle_login(&self) {
        tracing::info!("login handler invoked");
    }
}

pub async fn run_cache(cache: &HttpCache, command: CacheCommand) -> Result<Output> {
    match command {
        CacheCommand::Get { hash, bypass_expiration } => {
            let lookup = cache.lookup(&hash, bypass_expiration).await?;
            Ok(match lookup {
                Lookup::Hit(content) => Output::ok(content.to_display_string()),
                Lookup::Miss => Output::failed("miss"),
                Lookup::Expired { expire } => Output::failed(format!("expired at {expire}")),
                Lookup::Corrupt(reason) => Output::failed(format!("corrupt: {reason}")),
            })
        }
        CacheCommand::Set { hash, content, mime, ttl } => {
            let ttl = ttl.unwrap_or(cache.config().default_ttl_secs);
            let mut info = CacheInfo::expiring_in(ttl);
            if let Some(mime) = mime {
                info = info.with_mime(mime);
            }
            cache.set(&hash, &content, &info).await?;
            Ok(Output::ok(format!("stored {hash} (expires at {})", info.expire)))
        }
        CacheCommand::Del { hash } => {
            cache.del(&hash).await?;
            Ok(Output::ok(format!("deleted {hash}")))
        }
        CacheCommand::Reset => {
            cache.reset().await?;
            Ok(Output::ok("cache reset"))
        }
        CacheCommand::PurgeExpired => {
            let purged = cache.purge_expired().await?;
            Ok(Output::ok(format!("purged {purged} expired entries")))
        }
    }
}

pub async fn run_startup(config: StartupConfig, overrides: &[String]) -> Result<Output> {
    let overrides = parse_overrides(overrides)?;
    let network = HttpNetwork::new()?;
    let dispatcher = StartupDispatcher::new(config, network, LogAuthenticator)
        .with_overrides(&overrides)
        .context("invalid startup override")?;

    let outcome = dispatcher.handle().await;
    let reached_login = outcome.reached_login();
    let text = match outcome {
        StartupOutcome::Online { session } => {
            format!("online: session {} ({}), login started", session.server_url, session.status)
        }
        StartupOutcome::Offline => "offline: login started".to_string(),
        StartupOutcome::SessionFailed(e) => format!("online: session failed: {e}"),
        StartupOutcome::SessionTimedOut => "online: session timed out".to_string(),
    };

    Ok(Output { text, success: reached_login })
}

pub fn run_fingerprint(method: &str, url: &str, params: &str) -> Output {
    Output::ok(compute_fingerprint(method, url, params))
}
