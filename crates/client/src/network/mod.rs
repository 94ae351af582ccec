//! HTTP-backed connectivity check and server session.
//!
//! ### Connectivity
//! - `HEAD` against `startup.probe_url` with `startup.probe_timeout_ms`
//! - Any HTTP response counts as online, whatever the status
//! - Transport errors (DNS, refused, timeout) count as offline
//!
//! ### Session
//! - `GET` against `startup.server_url`
//! - 2xx opens the session; anything else is an error

use reqwest::{Client, header};
use tcache_core::{Error, StartupConfig, util};
use url::Url;

use crate::startup::{Network, ServerSession};

/// reqwest implementation of [`Network`].
#[derive(Clone, Debug)]
pub struct HttpNetwork {
    http: Client,
}

impl HttpNetwork {
    /// Build the underlying HTTP client.
    pub fn new() -> Result<Self, Error> {
        let http = Client::builder()
            .use_rustls_tls()
            .gzip(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, Error> {
    Url::parse(value).map_err(|e| Error::InvalidInput(format!("{field} is not a valid URL: {e}")))
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn is_online(&self, config: &StartupConfig) -> bool {
        let url = match parse_url("startup.probe_url", &config.probe_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("connectivity check skipped: {}", e);
                return false;
            }
        };

        let result = self
            .http
            .head(url)
            .header(header::USER_AGENT, &config.user_agent)
            .timeout(config.probe_timeout())
            .send()
            .await;

        match result {
            Ok(response) => {
                tracing::debug!("connectivity check answered with {}", response.status());
                true
            }
            Err(e) => {
                tracing::debug!("connectivity check failed: {}", e);
                false
            }
        }
    }

    async fn connect_to_server(&self, config: &StartupConfig) -> Result<ServerSession, Error> {
        let raw = config
            .server_url
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("startup.server_url is not configured".into()))?;
        let url = parse_url("startup.server_url", raw)?;

        tracing::debug!("opening server session: {}", url);

        let response = self
            .http
            .get(url.clone())
            .header(header::USER_AGENT, &config.user_agent)
            .send()
            .await
            .map_err(|e| Error::Network(format!("session request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("session request to {url} returned {status}")));
        }

        Ok(ServerSession { server_url: url.to_string(), status: status.as_u16(), established_at: util::timestamp() })
    }
}
