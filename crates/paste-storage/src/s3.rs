//! Object storage backend
//!
//! Paste text lives in a bucket reachable through `object_store`'s S3
//! client. MinIO and other S3-compatible servers work through a custom
//! endpoint, which switches the client to path-style requests.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{validate_key, BlobStore};
use crate::error::StorageError;

/// Bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "bin-backed";

/// Connection settings for the paste bucket
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible servers
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Path segment placed before `pastes/`
    pub prefix: Option<String>,
    /// Permit plain-HTTP endpoints
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            prefix: None,
            allow_http: false,
        }
    }
}

/// Blob store over an S3 bucket
///
/// Objects are written to `<prefix>/pastes/<key>`.
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl S3Storage {
    /// Build an S3 client from `config`. No request is made until first use.
    pub async fn new(config: S3Config) -> Result<Self, StorageError> {
        let builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_allow_http(config.allow_http);

        let builder = match &config.endpoint {
            Some(endpoint) => builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false),
            None => builder,
        };

        let builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => builder
                .with_access_key_id(id)
                .with_secret_access_key(secret),
            (None, None) => builder,
            _ => {
                return Err(StorageError::Configuration(
                    "access key and secret key must be set together".to_string(),
                ));
            }
        };

        let store = builder
            .build()
            .map_err(|e| StorageError::Configuration(format!("S3 client for bucket {}: {}", config.bucket, e)))?;

        let prefix = config
            .prefix
            .as_deref()
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_default();

        info!(
            "Using S3 bucket {} in {} (endpoint: {}, prefix: {:?})",
            config.bucket,
            config.region,
            config.endpoint.as_deref().unwrap_or("default"),
            prefix
        );

        Ok(Self::from_store(Arc::new(store), prefix))
    }

    /// Wrap an existing object store
    pub fn from_store(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Get the object path for a paste key
    fn object_path(&self, key: &str) -> Result<ObjectPath, StorageError> {
        validate_key(key)?;

        let path = if self.prefix.is_empty() {
            format!("pastes/{}", key)
        } else {
            format!("{}/pastes/{}", self.prefix, key)
        };

        ObjectPath::parse(&path).map_err(|e| StorageError::InvalidKey(format!("Invalid path: {}", e)))
    }
}

fn map_object_error(key: &str, e: object_store::Error) -> StorageError {
    match e {
        object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
        other => StorageError::S3(format!("{}: {}", key, other)),
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(e) => match map_object_error(key, e) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.object_path(key)?;
        debug!("Reading paste from S3: {:?}", path);

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| map_object_error(key, e))?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::S3(format!("Failed to read bytes: {}", e)))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Writing {} bytes to S3: {:?}", data.len(), path);

        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map(|_| ())
            .map_err(|e| map_object_error(key, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        debug!("Deleting paste from S3: {:?}", path);

        if !self.exists(key).await? {
            return Ok(false);
        }

        self.store
            .delete(&path)
            .await
            .map_err(|e| map_object_error(key, e))?;

        Ok(true)
    }

    fn storage_path(&self, key: &str) -> String {
        self.object_path(key)
            .map(|p| format!("s3://{}", p))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn memory_storage(prefix: &str) -> S3Storage {
        S3Storage::from_store(Arc::new(InMemory::new()), prefix)
    }

    #[test]
    fn test_object_path() {
        let storage = memory_storage("");
        assert_eq!(storage.storage_path("abc123"), "s3://pastes/abc123");

        let storage = memory_storage("tenant");
        assert_eq!(storage.storage_path("abc123"), "s3://tenant/pastes/abc123");
        assert_eq!(storage.storage_path("../abc"), "");
    }

    #[tokio::test]
    async fn test_rejects_half_configured_credentials() {
        let config = S3Config {
            access_key_id: Some("id".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            S3Storage::new(config).await,
            Err(StorageError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_endpoint_with_prefix() {
        let config = S3Config {
            endpoint: Some("http://localhost:9000".to_string()),
            access_key_id: Some("minioadmin".to_string()),
            secret_access_key: Some("minioadmin".to_string()),
            prefix: Some("/bin/".to_string()),
            allow_http: true,
            ..Default::default()
        };

        let storage = S3Storage::new(config).await.unwrap();
        assert_eq!(storage.storage_path("abc123"), "s3://bin/pastes/abc123");
    }

    #[tokio::test]
    async fn test_roundtrip_against_in_memory_store() {
        let storage = memory_storage("bin");

        storage
            .put("key0001", Bytes::from_static(b"some text"))
            .await
            .unwrap();
        assert_eq!(storage.get("key0001").await.unwrap(), Bytes::from_static(b"some text"));

        assert!(storage.delete("key0001").await.unwrap());
        assert!(!storage.delete("key0001").await.unwrap());
        assert!(matches!(
            storage.get("key0001").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
