//! Core types and shared functionality for tcache.
//!
//! This crate provides:
//! - HTTP response cache with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - JSON and timestamp helpers

pub mod cache;
pub mod config;
pub mod error;
pub mod util;

pub use cache::{CacheDb, CacheEntry, CacheInfo, CachedContent, HttpCache, Lookup};
pub use config::{AppConfig, CacheConfig, ConfigError, StartupConfig};
pub use error::Error;
