//! Blob store trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

/// Maximum accepted key length. Generated keys are at most 28 characters.
const MAX_KEY_LENGTH: usize = 128;

/// Blob store trait
///
/// Implementations hold the text content of pastes, addressed by the
/// paste key. Metadata about pastes lives elsewhere; a blob store only
/// knows about opaque objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check if an object exists
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Read an object fully into memory
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Write an object, replacing any previous content
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError>;

    /// Delete an object. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Get the storage location of a key (for logging)
    fn storage_path(&self, key: &str) -> String;
}

/// Validate a key before it is used to build a path.
///
/// Only the URL-safe base64 alphabet and digits are accepted, which rules
/// out path separators and `..` components.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".to_string()));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(StorageError::InvalidKey(format!(
            "key exceeds {} characters",
            MAX_KEY_LENGTH
        )));
    }

    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(StorageError::InvalidKey(format!(
            "key contains invalid characters: {}",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_generated_shape() {
        assert!(validate_key("aB3_-xYz20240101120000").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("key with space").is_err());
        assert!(validate_key(&"a".repeat(129)).is_err());
    }
}
