//! Paste lifecycle engine
//!
//! Orchestrates the blob store, metadata store and cache. The only
//! cross-store ordering contracts are:
//!
//! - save writes the blob before inserting metadata, so a metadata row
//!   never points at a missing blob (a crash in between leaves an
//!   unreachable blob instead);
//! - delete removes metadata before the blob, so a paste stops being
//!   fetchable before its content disappears.
//!
//! There is no transaction spanning both stores and no rollback.

use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use paste_db::{DbError, MetadataStore, NewPaste};
use paste_storage::{validate_key, BlobStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CachePolicy, PasteCache};
use crate::error::CoreError;
use crate::keygen::KeyGenerator;

/// A fetched paste: its text and expiration date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPaste {
    pub text: String,
    pub end_date: Option<NaiveDate>,
}

/// Paste engine handling save, fetch and delete
pub struct PasteEngine {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<dyn PasteCache>,
    keys: KeyGenerator,
    policy: CachePolicy,
}

impl PasteEngine {
    /// Create a new paste engine
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<dyn PasteCache>,
        keys: KeyGenerator,
        policy: CachePolicy,
    ) -> Self {
        info!(
            "Initializing paste engine (key length: {}, cache ttl: {:?}, access window: {:?}, threshold: {})",
            keys.random_length(),
            policy.entry_ttl,
            policy.access_window,
            policy.promotion_threshold
        );

        Self {
            metadata,
            blobs,
            cache,
            keys,
            policy,
        }
    }

    /// Save a paste and return its key.
    ///
    /// `end_date`, when given, must be strictly after today. `None` means
    /// the paste never expires.
    pub async fn save(&self, text: &str, end_date: Option<NaiveDate>) -> Result<String, CoreError> {
        self.save_on(text, end_date, Utc::now().date_naive()).await
    }

    /// Save a paste as if the current UTC date were `today`
    pub async fn save_on(
        &self,
        text: &str,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<String, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation("text must not be empty".to_string()));
        }
        if let Some(end) = end_date
            && end <= today
        {
            return Err(CoreError::Validation(format!(
                "end date {} must be after {}",
                end, today
            )));
        }

        let key = self.keys.generate();
        debug!("Saving paste {} ({} bytes)", key, text.len());

        self.blobs
            .put(&key, Bytes::copy_from_slice(text.as_bytes()))
            .await
            .map_err(|e| CoreError::storage("put", &key, e))?;

        let record = NewPaste {
            key: key.clone(),
            create_date: today,
            end_date,
        };

        if let Err(e) = self.metadata.insert(record).await {
            warn!(
                "Metadata insert failed for {}, blob at {} is orphaned: {}",
                key,
                self.blobs.storage_path(&key),
                e
            );
            return Err(match e {
                DbError::Duplicate(k) => CoreError::KeyCollision(k),
                other => CoreError::database("insert", &key, other),
            });
        }

        metrics::counter!("pastebin_pastes_saved_total").increment(1);
        info!("Saved paste {} (expires: {:?})", key, end_date);
        Ok(key)
    }

    /// Fetch a paste by key. Returns `None` if no such paste exists,
    /// including keys that could never have been generated.
    pub async fn fetch(&self, key: &str) -> Result<Option<FetchedPaste>, CoreError> {
        if !is_storable_key(key)? {
            debug!("Malformed paste key {:?}, treating as not found", key);
            return Ok(None);
        }

        let paste = match self
            .metadata
            .find_by_key(key)
            .await
            .map_err(|e| CoreError::database("lookup", key, e))?
        {
            Some(p) => p,
            None => {
                debug!("Paste not found: {}", key);
                return Ok(None);
            }
        };

        metrics::counter!("pastebin_pastes_fetched_total").increment(1);

        match self.cache.get(key).await {
            Ok(Some(text)) => {
                debug!("Cache hit for paste {}", key);
                metrics::counter!("pastebin_cache_hits_total").increment(1);
                return Ok(Some(FetchedPaste {
                    text,
                    end_date: paste.end_date,
                }));
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}, reading from storage: {}", key, e),
        }

        metrics::counter!("pastebin_cache_misses_total").increment(1);
        let text = self.download(key).await?;

        if self.should_cache(key).await {
            match self.cache.set_with_ttl(key, &text, self.policy.entry_ttl).await {
                Ok(()) => {
                    debug!("Promoted paste {} into cache", key);
                    metrics::counter!("pastebin_cache_promotions_total").increment(1);
                }
                Err(e) => warn!("Failed to cache paste {}: {}", key, e),
            }
        }

        Ok(Some(FetchedPaste {
            text,
            end_date: paste.end_date,
        }))
    }

    /// Delete a paste by key.
    ///
    /// Deleting a key that does not exist is not an error. If the blob
    /// delete fails after the metadata row is gone, the error is returned
    /// and the blob stays behind. A malformed key names no paste and
    /// leaves the stores untouched.
    pub async fn delete(&self, key: &str) -> Result<(), CoreError> {
        if !is_storable_key(key)? {
            debug!("Malformed paste key {:?}, nothing to delete", key);
            return Ok(());
        }
        debug!("Deleting paste {}", key);

        let had_metadata = self
            .metadata
            .delete_by_key(key)
            .await
            .map_err(|e| CoreError::database("delete", key, e))?;

        self.blobs
            .delete(key)
            .await
            .map_err(|e| CoreError::storage("delete", key, e))?;

        if let Err(e) = self.cache.evict(key).await {
            warn!("Failed to evict cached paste {}: {}", key, e);
        }

        if had_metadata {
            metrics::counter!("pastebin_pastes_deleted_total").increment(1);
            info!("Deleted paste {}", key);
        }
        Ok(())
    }

    /// Read a blob fully and decode it as text
    async fn download(&self, key: &str) -> Result<String, CoreError> {
        let data = self.blobs.get(key).await.map_err(|e| {
            if matches!(e, paste_storage::StorageError::NotFound(_)) {
                warn!("Paste {} has metadata but no blob", key);
            }
            CoreError::storage("get", key, e)
        })?;

        String::from_utf8(data.to_vec()).map_err(|_| CoreError::InvalidContent(key.to_string()))
    }

    /// Count this read and decide whether the text should be cached.
    /// A failing counter never promotes.
    async fn should_cache(&self, key: &str) -> bool {
        match self
            .cache
            .increment_with_ttl(key, self.policy.access_window)
            .await
        {
            Ok(count) => self.policy.should_promote(count),
            Err(e) => {
                warn!("Failed to count access for {}: {}", key, e);
                false
            }
        }
    }
}

/// An empty key is a bad request; any other key the stores would reject
/// simply cannot exist.
fn is_storable_key(key: &str) -> Result<bool, CoreError> {
    if key.is_empty() {
        return Err(CoreError::Validation("key must not be empty".to_string()));
    }
    Ok(validate_key(key).is_ok())
}
