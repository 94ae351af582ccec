//! App-startup dispatch.
//!
//! On launch the dispatcher asks the network whether the device is online.
//! Online: open a server session, then hand off to login once it succeeds.
//! Offline: hand off to login straight away.
//!
//! A failed session does not reach login. No retry is attempted; the caller
//! sees [`StartupOutcome::SessionFailed`] and decides what to do.

use serde::Serialize;
use tcache_core::{ConfigError, Error, StartupConfig};

/// An established server session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSession {
    pub server_url: String,
    pub status: u16,
    /// Unix seconds.
    pub established_at: i64,
}

/// Connectivity collaborator.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Whether the device can currently reach the network.
    async fn is_online(&self, config: &StartupConfig) -> bool;

    /// Open a session with the application server.
    async fn connect_to_server(&self, config: &StartupConfig) -> Result<ServerSession, Error>;
}

/// Login collaborator. Owned by the host application.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn handle_login(&self);
}

/// Which startup path ran.
#[derive(Debug)]
pub enum StartupOutcome {
    /// Session opened, login invoked.
    Online { session: ServerSession },
    /// No connectivity, login invoked without a session.
    Offline,
    /// Session call failed; login was not invoked.
    SessionFailed(Error),
    /// Session call exceeded `session_timeout_ms`; login was not invoked.
    SessionTimedOut,
}

impl StartupOutcome {
    /// Whether the login entry point was reached.
    pub fn reached_login(&self) -> bool {
        matches!(self, StartupOutcome::Online { .. } | StartupOutcome::Offline)
    }
}

/// Runs the startup flow against its collaborators.
pub struct StartupDispatcher<N, A> {
    config: StartupConfig,
    network: N,
    auth: A,
}

impl<N: Network, A: Authenticator> StartupDispatcher<N, A> {
    pub fn new(config: StartupConfig, network: N, auth: A) -> Self {
        Self { config, network, auth }
    }

    /// Apply caller overrides on top of the current settings.
    ///
    /// Named keys replace existing values; nothing is validated beyond
    /// the value shape.
    pub fn with_overrides<T: Serialize>(mut self, overrides: &T) -> Result<Self, ConfigError> {
        self.config = self.config.with_overrides(overrides)?;
        Ok(self)
    }

    pub fn config(&self) -> &StartupConfig {
        &self.config
    }

    /// Check connectivity and run the matching path.
    pub async fn handle(&self) -> StartupOutcome {
        if !self.network.is_online(&self.config).await {
            tracing::info!("startup: offline, proceeding to login");
            self.auth.handle_login().await;
            return StartupOutcome::Offline;
        }

        tracing::debug!("startup: online, opening server session");
        let result = match self.config.session_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.network.connect_to_server(&self.config)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("startup: server session timed out after {}ms", limit.as_millis());
                    return StartupOutcome::SessionTimedOut;
                }
            },
            None => self.network.connect_to_server(&self.config).await,
        };

        match result {
            Ok(session) => {
                tracing::info!("startup: session open with {}, proceeding to login", session.server_url);
                self.auth.handle_login().await;
                StartupOutcome::Online { session }
            }
            Err(e) => {
                tracing::warn!("startup: server session failed, login skipped: {}", e);
                StartupOutcome::SessionFailed(e)
            }
        }
    }
}
