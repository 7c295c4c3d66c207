//! In-memory store doubles for engine and sweeper tests

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use paste_db::{DbError, MetadataStore, NewPaste, Paste};
use paste_storage::{BlobStore, StorageError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Blob store that counts calls and can be told to fail
#[derive(Default)]
pub struct CountingBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
}

impl CountingBlobStore {
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        self.objects.lock().remove(key);
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make deletes of a single key fail
    pub fn fail_delete_of(&self, key: &str) {
        self.failing_keys.lock().insert(key.to_string());
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.contains(key))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::S3("injected put failure".to_string()));
        }
        self.objects.lock().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) || self.failing_keys.lock().contains(key) {
            return Err(StorageError::S3("injected delete failure".to_string()));
        }
        Ok(self.objects.lock().remove(key).is_some())
    }

    fn storage_path(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}

/// Metadata store backed by a map
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: Mutex<HashMap<String, Paste>>,
    next_id: AtomicUsize,
    fail_inserts: AtomicBool,
    reject_as_duplicate: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn reject_all_as_duplicate(&self, reject: bool) {
        self.reject_as_duplicate.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, paste: NewPaste) -> Result<Paste, DbError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbError::Connection(sqlx_unavailable()));
        }

        let mut records = self.records.lock();
        if self.reject_as_duplicate.load(Ordering::SeqCst) || records.contains_key(&paste.key) {
            return Err(DbError::Duplicate(paste.key));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let record = Paste {
            id,
            key: paste.key.clone(),
            create_date: paste.create_date,
            end_date: paste.end_date,
        };
        records.insert(paste.key, record.clone());
        Ok(record)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Paste>, DbError> {
        Ok(self.records.lock().get(key).cloned())
    }

    async fn delete_by_key(&self, key: &str) -> Result<bool, DbError> {
        Ok(self.records.lock().remove(key).is_some())
    }

    async fn list_expired_before(&self, date: NaiveDate) -> Result<Vec<Paste>, DbError> {
        let mut expired: Vec<Paste> = self
            .records
            .lock()
            .values()
            .filter(|p| p.is_expired(date))
            .cloned()
            .collect();
        expired.sort_by(|a, b| a.end_date.cmp(&b.end_date).then(a.key.cmp(&b.key)));
        Ok(expired)
    }
}

fn sqlx_unavailable() -> paste_db::SqlxError {
    paste_db::SqlxError::PoolTimedOut
}
