//! Row-level operations on the `http` table.
//!
//! These are plain CRUD calls with no expiry or mime logic; `HttpCache`
//! layers the read rules on top.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached HTTP response row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request fingerprint.
    pub id: String,
    /// Unix seconds after which the entry is stale. NULL reads as 0.
    pub expire: i64,
    /// Unix seconds at write time.
    pub creation: i64,
    /// Response body as stored. NULL marks a corrupt entry on read.
    pub content: Option<String>,
    /// Serialized `CacheInfo`.
    pub info: Option<String>,
}

impl CacheDb {
    /// Insert or fully replace the row keyed by `entry.id`.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO http (id, expire, creation, content, info)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![&entry.id, entry.expire, entry.creation, &entry.content, &entry.info],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a row by fingerprint.
    ///
    /// Returns None if the fingerprint doesn't exist in the cache.
    pub async fn get_entry(&self, id: &str) -> Result<Option<CacheEntry>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt =
                    conn.prepare("SELECT id, expire, creation, content, info FROM http WHERE id = ?1 LIMIT 1")?;

                let result = stmt.query_row(params![id], |row| {
                    Ok(CacheEntry {
                        id: row.get(0)?,
                        expire: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                        creation: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                        content: row.get(3)?,
                        info: row.get(4)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the row for a fingerprint.
    ///
    /// Returns the number of deleted rows (0 or 1).
    pub async fn delete_entry(&self, id: &str) -> Result<u64, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM http WHERE id = ?1", params![id])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every row.
    pub async fn delete_all_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM http", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete rows whose `expire` is before `now`.
    ///
    /// Rows with a NULL `expire` count as expired.
    pub async fn delete_expired_entries(&self, now: i64) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count =
                    conn.execute("DELETE FROM http WHERE expire IS NULL OR expire < ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of rows in the table.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM http", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
