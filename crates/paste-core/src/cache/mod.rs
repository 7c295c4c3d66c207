//! Paste text cache
//!
//! The cache is never authoritative: every entry can be rebuilt from the
//! blob store. Text is only promoted into it once a key has been read
//! often enough within the access window (see [`CachePolicy`]).

mod memory;
mod policy;
mod redis;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheError;

pub use memory::{spawn_purge_task, MemoryCache};
pub use policy::{
    CachePolicy, DEFAULT_ACCESS_WINDOW, DEFAULT_ENTRY_TTL, DEFAULT_PROMOTION_THRESHOLD,
};
pub use redis::{RedisCache, RedisCacheConfig};

/// Cache backend trait
///
/// Text entries and access counters live in separate namespaces, so a
/// counter for a key never shadows that key's cached text.
#[async_trait]
pub trait PasteCache: Send + Sync {
    /// Get cached text for a key. Returns `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store text for a key, expiring after `ttl`
    async fn set_with_ttl(&self, key: &str, text: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Atomically increment the access counter for a key and return the new
    /// count. The first increment of a fresh counter sets its expiry to `ttl`;
    /// later increments leave the expiry untouched.
    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Drop cached text and the access counter for a key
    async fn evict(&self, key: &str) -> Result<(), CacheError>;
}
