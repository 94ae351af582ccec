//! Timestamp and JSON helpers shared by the cache and the CLI.

use serde_json::Value;

/// Current time as unix seconds.
pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Parse a JSON document, returning `None` instead of an error.
///
/// Callers treat unparseable text as "no structured value", so the parse
/// error is only logged at debug level.
pub fn parse_json(text: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("failed to parse JSON ({} bytes): {}", text.len(), e);
            None
        }
    }
}
