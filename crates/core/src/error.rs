//! Unified error types for tcache.
//!
//! Every variant renders with a stable upper-case code prefix so log lines
//! and CLI output can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cache and the startup flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty fingerprint).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The cache database was never opened. Permanent for the process.
    #[error("CACHE_UNAVAILABLE: database not open")]
    StoreUnavailable,

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Entry metadata could not be serialized for storage.
    #[error("CACHE_ERROR: invalid entry info: {0}")]
    InvalidInfo(String),

    /// Transport-level failure talking to the network.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Server session could not be established.
    #[error("SESSION_FAILED: {0}")]
    SessionFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInfo(err.to_string())
    }
}

impl Error {
    /// Whether this error means the store is gone for good.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable)
    }
}
