//! HTTP response cache keyed by request fingerprint.
//!
//! `HttpCache` is the public face of the `http` table. Reads follow a fixed
//! order: existence, then expiry (unless bypassed), then content integrity,
//! then decoding by the `mime` recorded in the entry info. Stale rows are
//! never removed by a read.
//!
//! A cache whose database could not be opened stays in a degraded state for
//! its whole lifetime: every call logs `database not open` and reports
//! [`Error::StoreUnavailable`] (or `None` from [`HttpCache::get`]).

use super::connection::CacheDb;
use super::entries::CacheEntry;
use crate::config::{AppConfig, CacheConfig};
use crate::{Error, util};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mime discriminator that makes reads decode content as JSON.
pub const JSON_MIME: &str = "json";

/// Metadata stored alongside a response.
///
/// Fields other than `expire` and `mime` are kept verbatim in `extra` and
/// survive the trip through the `info` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub expire: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CacheInfo {
    pub fn new(expire: i64) -> Self {
        Self { expire, mime: None, extra: Map::new() }
    }

    /// Info expiring `ttl_secs` from now. Clamps at `i64::MAX`/`i64::MIN`.
    pub fn expiring_in(ttl_secs: i64) -> Self {
        Self::new(util::timestamp().saturating_add(ttl_secs))
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_json(&self) -> bool {
        self.mime.as_deref() == Some(JSON_MIME)
    }
}

/// The logical value of a cache hit.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedContent {
    /// Content recorded with `mime = "json"`, parsed back.
    Json(Value),
    /// Any other content, exactly as stored.
    Text(String),
}

impl CachedContent {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CachedContent::Json(v) => Some(v),
            CachedContent::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CachedContent::Json(_) => None,
            CachedContent::Text(s) => Some(s.as_str()),
        }
    }

    /// Render for display: compact JSON or the raw text.
    pub fn to_display_string(&self) -> String {
        match self {
            CachedContent::Json(v) => v.to_string(),
            CachedContent::Text(s) => s.clone(),
        }
    }
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(CachedContent),
    Miss,
    /// The row exists but `expire < now`.
    Expired { expire: i64 },
    /// The row exists but its content cannot be returned.
    Corrupt(String),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Collapse everything but a hit into `None`.
    pub fn into_content(self) -> Option<CachedContent> {
        match self {
            Lookup::Hit(content) => Some(content),
            _ => None,
        }
    }
}

/// Persistent HTTP response cache.
#[derive(Clone, Debug)]
pub struct HttpCache {
    db: Option<CacheDb>,
    config: CacheConfig,
}

impl HttpCache {
    /// Wrap an already opened database.
    pub fn new(db: CacheDb, config: CacheConfig) -> Self {
        Self { db: Some(db), config }
    }

    /// A cache with no backing store. Every operation fails closed.
    pub fn unavailable(config: CacheConfig) -> Self {
        Self { db: None, config }
    }

    /// Open the database named in `config`, falling back to the degraded
    /// state if that fails. There is no retry.
    pub async fn open(config: &AppConfig) -> Self {
        match CacheDb::open(&config.db_path).await {
            Ok(db) => Self::new(db, config.http.cache.clone()),
            Err(e) => {
                tracing::error!(path = %config.db_path.display(), "http cache: failed to open database: {}", e);
                Self::unavailable(config.http.cache.clone())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.db.is_some()
    }

    /// The `http.cache` configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn store(&self) -> Result<&CacheDb, Error> {
        self.db.as_ref().ok_or_else(|| {
            tracing::error!("http cache: database not open");
            Error::StoreUnavailable
        })
    }

    /// Write a response, replacing any previous entry for `hash`.
    ///
    /// `creation` is stamped with the current time.
    pub async fn set(&self, hash: &str, content: &str, info: &CacheInfo) -> Result<(), Error> {
        let db = self.store()?;

        let entry = CacheEntry {
            id: hash.to_string(),
            expire: info.expire,
            creation: util::timestamp(),
            content: Some(content.to_string()),
            info: Some(serde_json::to_string(info)?),
        };

        db.put_entry(&entry).await.inspect_err(|e| {
            tracing::warn!("http cache: write failed for {}: {}", hash, e);
        })
    }

    /// Read an entry, honoring expiry unless `bypass_expiration` is set.
    pub async fn lookup(&self, hash: &str, bypass_expiration: bool) -> Result<Lookup, Error> {
        self.lookup_at(hash, bypass_expiration, util::timestamp()).await
    }

    /// [`HttpCache::lookup`] against an explicit clock value.
    pub async fn lookup_at(&self, hash: &str, bypass_expiration: bool, now: i64) -> Result<Lookup, Error> {
        let db = self.store()?;

        let Some(entry) = db.get_entry(hash).await? else {
            return Ok(Lookup::Miss);
        };

        if !bypass_expiration {
            tracing::debug!(
                "http cache: {} expires at {} (now {}, {}min left)",
                hash,
                entry.expire,
                now,
                entry.expire.saturating_sub(now).div_euclid(60)
            );
            if entry.expire < now {
                return Ok(Lookup::Expired { expire: entry.expire });
            }
        }

        let Some(content) = entry.content else {
            tracing::error!("http cache: {} has no content", hash);
            return Ok(Lookup::Corrupt("content is missing".into()));
        };

        Ok(decode(hash, entry.info.as_deref(), content))
    }

    /// Fail-closed read: the stored value on a hit, `None` otherwise.
    pub async fn get(&self, hash: &str, bypass_expiration: bool) -> Option<CachedContent> {
        match self.lookup(hash, bypass_expiration).await {
            Ok(lookup) => lookup.into_content(),
            Err(e) if e.is_unavailable() => None,
            Err(e) => {
                tracing::warn!("http cache: read failed for {}: {}", hash, e);
                None
            }
        }
    }

    /// Remove the entry for `hash`. Removing a missing entry is not an error.
    pub async fn del(&self, hash: &str) -> Result<(), Error> {
        self.store()?.delete_entry(hash).await.map(|_| ())
    }

    /// Remove every entry.
    pub async fn reset(&self) -> Result<(), Error> {
        let deleted = self.store()?.delete_all_entries().await?;
        tracing::debug!("http cache: reset removed {} entries", deleted);
        Ok(())
    }

    /// Remove entries that are already stale. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.store()?.delete_expired_entries(util::timestamp()).await
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> Result<u64, Error> {
        self.store()?.count_entries().await
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

fn decode(hash: &str, info: Option<&str>, content: String) -> Lookup {
    let info = match info.and_then(util::parse_json) {
        Some(info) => info,
        None => {
            tracing::warn!("http cache: {} has unreadable info, returning raw content", hash);
            return Lookup::Hit(CachedContent::Text(content));
        }
    };

    if info.get("mime").and_then(Value::as_str) != Some(JSON_MIME) {
        return Lookup::Hit(CachedContent::Text(content));
    }

    match util::parse_json(&content) {
        Some(value) => Lookup::Hit(CachedContent::Json(value)),
        None => {
            tracing::error!("http cache: {} has invalid JSON content", hash);
            Lookup::Corrupt("content is not valid JSON".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn open_cache() -> HttpCache {
        let db = CacheDb::open_in_memory().await.unwrap();
        HttpCache::new(db, CacheConfig::default())
    }

    #[tokio::test]
    async fn test_json_entry_round_trip() {
        let cache = open_cache().await;
        let now = util::timestamp();

        cache
            .set("a1", r#"{"x":1}"#, &CacheInfo::new(now + 60).with_mime("json"))
            .await
            .unwrap();

        let content = cache.get("a1", false).await.unwrap();
        assert_eq!(content, CachedContent::Json(json!({"x": 1})));
        assert_eq!(content.as_json().and_then(|v| v.get("x")), Some(&json!(1)));
        assert!(content.as_text().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_needs_bypass() {
        let cache = open_cache().await;
        let now = util::timestamp();

        cache
            .set("a2", "plain", &CacheInfo::new(now - 10).with_mime("text"))
            .await
            .unwrap();

        assert!(cache.get("a2", false).await.is_none());
        assert_eq!(cache.get("a2", true).await, Some(CachedContent::Text("plain".into())));
    }

    #[tokio::test]
    async fn test_expired_lookup_keeps_row() {
        let cache = open_cache().await;
        cache.set("old", "body", &CacheInfo::new(100)).await.unwrap();

        let lookup = cache.lookup_at("old", false, 200).await.unwrap();
        assert_eq!(lookup, Lookup::Expired { expire: 100 });
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expire_equal_to_now_is_fresh() {
        let cache = open_cache().await;
        cache.set("edge", "body", &CacheInfo::new(500)).await.unwrap();

        let lookup = cache.lookup_at("edge", false, 500).await.unwrap();
        assert!(lookup.is_hit());
        assert!(!cache.lookup_at("edge", false, 501).await.unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_miss() {
        let cache = open_cache().await;
        assert_eq!(cache.lookup("nope", false).await.unwrap(), Lookup::Miss);
        assert!(cache.get("nope", true).await.is_none());
    }

    #[tokio::test]
    async fn test_non_json_mime_returns_raw_string() {
        let cache = open_cache().await;
        let info = CacheInfo::expiring_in(60).with_mime("text");
        cache.set("t", r#"{"looks":"like json"}"#, &info).await.unwrap();

        let content = cache.get("t", false).await.unwrap();
        assert_eq!(content.as_text(), Some(r#"{"looks":"like json"}"#));
    }

    #[tokio::test]
    async fn test_missing_mime_returns_raw_string() {
        let cache = open_cache().await;
        cache.set("m", "bytes", &CacheInfo::expiring_in(60)).await.unwrap();
        assert_eq!(cache.get("m", false).await, Some(CachedContent::Text("bytes".into())));
    }

    #[tokio::test]
    async fn test_del_removes_entry() {
        let cache = open_cache().await;
        cache.set("d", "body", &CacheInfo::expiring_in(60)).await.unwrap();

        cache.del("d").await.unwrap();
        assert!(cache.get("d", true).await.is_none());

        // deleting again is a no-op
        cache.del("d").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_removes_everything() {
        let cache = open_cache().await;
        for hash in ["r1", "r2", "r3"] {
            cache.set(hash, "body", &CacheInfo::expiring_in(60)).await.unwrap();
        }

        cache.reset().await.unwrap();

        for hash in ["r1", "r2", "r3"] {
            assert!(cache.get(hash, true).await.is_none());
        }
        assert!(cache.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_second_write_supersedes_first() {
        let cache = open_cache().await;
        cache
            .set("w", r#"{"v":1}"#, &CacheInfo::expiring_in(60).with_mime("json"))
            .await
            .unwrap();
        cache.set("w", "v2", &CacheInfo::new(1).with_mime("text")).await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 1);
        assert!(cache.get("w", false).await.is_none());
        assert_eq!(cache.get("w", true).await, Some(CachedContent::Text("v2".into())));
    }

    #[tokio::test]
    async fn test_info_extra_fields_are_stored() {
        let cache = open_cache().await;
        let info = CacheInfo::new(42).with_mime("json").with_extra("ttl", json!(60));
        cache.set("i", "{}", &info).await.unwrap();

        let db = cache.db.as_ref().unwrap();
        let entry = db.get_entry("i").await.unwrap().unwrap();
        let stored: CacheInfo = serde_json::from_str(entry.info.as_deref().unwrap()).unwrap();
        assert_eq!(stored, info);
        assert!(stored.is_json());
        assert_eq!(entry.expire, 42);
        assert!(entry.creation > 0);
    }

    #[tokio::test]
    async fn test_null_content_is_corrupt() {
        let cache = open_cache().await;
        let db = cache.db.as_ref().unwrap();
        db.put_entry(&CacheEntry {
            id: "c".into(),
            expire: i64::MAX,
            creation: 0,
            content: None,
            info: Some(r#"{"expire":0,"mime":"json"}"#.into()),
        })
        .await
        .unwrap();

        assert!(matches!(cache.lookup("c", false).await.unwrap(), Lookup::Corrupt(_)));
        assert!(cache.get("c", true).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_content_is_corrupt() {
        let cache = open_cache().await;
        cache
            .set("bad", "{not json", &CacheInfo::expiring_in(60).with_mime("json"))
            .await
            .unwrap();

        assert!(matches!(cache.lookup("bad", false).await.unwrap(), Lookup::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_unreadable_info_returns_raw_content() {
        let cache = open_cache().await;
        let db = cache.db.as_ref().unwrap();
        db.put_entry(&CacheEntry {
            id: "u".into(),
            expire: i64::MAX,
            creation: 0,
            content: Some(r#"{"x":1}"#.into()),
            info: Some("garbage".into()),
        })
        .await
        .unwrap();

        assert_eq!(cache.get("u", false).await, Some(CachedContent::Text(r#"{"x":1}"#.into())));
    }

    #[tokio::test]
    async fn test_null_expire_is_stale() {
        let cache = open_cache().await;
        let db = cache.db.as_ref().unwrap();
        db.conn
            .call(|conn| {
                conn.execute("INSERT INTO http (id, content, info) VALUES ('n', 'body', '{\"mime\":\"text\"}')", [])
            })
            .await
            .unwrap();

        assert_eq!(cache.lookup("n", false).await.unwrap(), Lookup::Expired { expire: 0 });
        assert_eq!(cache.get("n", true).await, Some(CachedContent::Text("body".into())));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = open_cache().await;
        let now = util::timestamp();
        cache.set("stale", "a", &CacheInfo::new(now - 100)).await.unwrap();
        cache.set("fresh", "b", &CacheInfo::new(now + 100)).await.unwrap();

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert!(cache.get("stale", true).await.is_none());
        assert!(cache.get("fresh", false).await.is_some());
    }

    #[tokio::test]
    async fn test_empty_hash_is_a_regular_key() {
        let cache = open_cache().await;
        cache.set("", "body", &CacheInfo::expiring_in(60).with_mime("text")).await.unwrap();

        assert_eq!(cache.get("", true).await, Some(CachedContent::Text("body".into())));
        assert_eq!(cache.get("", false).await, Some(CachedContent::Text("body".into())));

        cache.del("").await.unwrap();
        assert!(cache.get("", true).await.is_none());
    }

    #[test]
    fn test_expiring_in_saturates() {
        assert_eq!(CacheInfo::expiring_in(i64::MAX).expire, i64::MAX);
        assert!(CacheInfo::expiring_in(i64::MIN).expire < 0);
    }

    #[tokio::test]
    async fn test_max_ttl_entry_is_fresh() {
        let cache = open_cache().await;
        cache.set("long", "body", &CacheInfo::expiring_in(i64::MAX)).await.unwrap();

        assert_eq!(cache.lookup("long", false).await.unwrap(), Lookup::Hit(CachedContent::Text("body".into())));
    }

    #[tokio::test]
    async fn test_unavailable_cache_fails_closed() {
        let cache = HttpCache::unavailable(CacheConfig::default());
        assert!(!cache.is_available());

        let set = cache.set("a1", "body", &CacheInfo::expiring_in(60)).await;
        assert!(matches!(set, Err(Error::StoreUnavailable)));
        assert!(matches!(cache.lookup("a1", true).await, Err(Error::StoreUnavailable)));
        assert!(cache.get("a1", true).await.is_none());
        assert!(matches!(cache.del("a1").await, Err(Error::StoreUnavailable)));
        assert!(matches!(cache.reset().await, Err(Error::StoreUnavailable)));
        assert!(matches!(cache.purge_expired().await, Err(Error::StoreUnavailable)));
    }

    #[tokio::test]
    async fn test_open_bad_path_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { db_path: dir.path().join("missing").join("db.sqlite"), ..Default::default() };

        let cache = HttpCache::open(&config).await;
        assert!(!cache.is_available());
        assert!(cache.get("anything", true).await.is_none());
    }

    #[tokio::test]
    async fn test_open_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { db_path: dir.path().join("cache.sqlite"), ..Default::default() };

        let cache = HttpCache::open(&config).await;
        assert!(cache.is_available());
        assert_eq!(cache.config().default_ttl_secs, 3600);
        cache.set("p", "kept", &CacheInfo::expiring_in(60)).await.unwrap();
        drop(cache);

        let reopened = HttpCache::open(&config).await;
        assert_eq!(reopened.get("p", false).await, Some(CachedContent::Text("kept".into())));
    }
}
