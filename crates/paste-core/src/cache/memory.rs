//! In-process cache backend
//!
//! Suitable for a single instance and for tests. Counters are per process,
//! so a multi-instance deployment should use the Redis backend instead.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::PasteCache;
use crate::error::CacheError;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Slot<T> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory cache with per-entry expiry
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Slot<String>>>,
    counters: Mutex<HashMap<String, Slot<i64>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live text entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|s| s.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored text entries and counters, expired or not
    pub fn slot_count(&self) -> usize {
        self.entries.lock().len() + self.counters.lock().len()
    }

    /// Remove expired entries and counters, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, slot| slot.is_live(now));
        let mut removed = before - entries.len();
        drop(entries);

        let mut counters = self.counters.lock();
        let before = counters.len();
        counters.retain(|_, slot| slot.is_live(now));
        removed += before - counters.len();

        if removed > 0 {
            debug!("Purged {} expired cache slots", removed);
        }
        removed
    }
}

/// Spawn a background task that purges expired slots every `every`
pub fn spawn_purge_task(cache: Arc<MemoryCache>, every: Duration) -> tokio::task::JoinHandle<()> {
    info!("Starting background cache purge task (interval: {:?})", every);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);

        // The first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            cache.purge_expired();
        }
    })
}

#[async_trait]
impl PasteCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(slot) if slot.is_live(now) => Ok(Some(slot.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, text: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().insert(
            key.to_string(),
            Slot {
                value: text.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut counters = self.counters.lock();

        let slot = counters
            .entry(key.to_string())
            .and_modify(|slot| {
                if slot.is_live(now) {
                    slot.value += 1;
                } else {
                    slot.value = 1;
                    slot.expires_at = now + ttl;
                }
            })
            .or_insert_with(|| Slot {
                value: 1,
                expires_at: now + ttl,
            });

        Ok(slot.value)
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        self.counters.lock().remove(key);
        Ok(())
    }
}
