//! Request fingerprints used as cache keys.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The method is upper-cased so `get` and `GET` map to the same entry.
/// `params` is whatever the caller serialized for the request body or query.
pub fn compute_fingerprint(method: &str, url: &str, params: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(params.as_bytes());
    hex::encode(hasher.finalize())
}
