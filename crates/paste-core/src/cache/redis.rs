//! Redis cache backend
//!
//! Text is stored as plain strings under `<prefix>:paste:<key>` and access
//! counters under `<prefix>:access_count:<key>`. Counters are shared by
//! every instance pointing at the same Redis, which keeps the promotion
//! signal accurate behind a load balancer.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, Script};
use std::time::Duration;
use tracing::info;

use super::PasteCache;
use crate::error::CacheError;

/// Increment a counter and start its expiry on the first increment.
/// Runs atomically on the server, so concurrent readers never observe a
/// counter without a TTL.
const INCREMENT_WITH_TTL: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Configuration for the Redis cache backend
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`)
    pub url: String,
    /// Key prefix applied to every Redis key
    pub prefix: String,
    /// Number of connections in the pool
    pub pool_size: usize,
    /// Timeout for acquiring a pooled connection
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            prefix: "pastebin".to_string(),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis-backed implementation of [`PasteCache`]
pub struct RedisCache {
    pool: Pool,
    prefix: String,
    increment: Script,
}

impl RedisCache {
    /// Create a new Redis cache from the provided configuration.
    ///
    /// The pool connects lazily, so an unreachable server surfaces on the
    /// first cache call rather than here.
    pub fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CacheError::Connection(e.to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!(
            "Initialized Redis cache: url={}, prefix={}, pool_size={}",
            config.url, config.prefix, config.pool_size
        );

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            increment: Script::new(INCREMENT_WITH_TTL),
        })
    }

    fn text_key(&self, key: &str) -> String {
        format!("{}:paste:{}", self.prefix, key)
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}:access_count:{}", self.prefix, key)
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl PasteCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        conn.get(self.text_key(key))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn set_with_ttl(&self, key: &str, text: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.pset_ex::<_, _, ()>(self.text_key(key), text, ttl_millis(ttl))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut conn = self.conn().await?;
        self.increment
            .key(self.counter_key(key))
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(vec![self.text_key(key), self.counter_key(key)])
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RedisCacheConfig::default();
        assert_eq!(cfg.url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.prefix, "pastebin");
        assert_eq!(cfg.pool_size, 10);
        assert_eq!(cfg.connection_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_key_namespaces() {
        let cache = RedisCache::new(&RedisCacheConfig::default()).unwrap();
        assert_eq!(cache.text_key("abc"), "pastebin:paste:abc");
        assert_eq!(cache.counter_key("abc"), "pastebin:access_count:abc");
    }

    #[test]
    fn test_ttl_millis() {
        assert_eq!(ttl_millis(Duration::from_secs(600)), 600_000);
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }
}
