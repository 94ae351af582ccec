//! SQLite-backed HTTP response cache.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - One row per request fingerprint, replaced wholesale on write
//! - Expiry evaluated lazily on read, with an explicit bypass
//! - JSON or raw content decoding driven by the stored `mime`
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use hash::compute_fingerprint;
pub use store::{CacheInfo, CachedContent, HttpCache, JSON_MIME, Lookup};
