//! Core error types

use paste_db::DbError;
use paste_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Paste not found: {0}")]
    NotFound(String),

    #[error("Key collision: {0}")]
    KeyCollision(String),

    #[error("Storage error during {operation} of {key}: {source}")]
    Storage {
        operation: &'static str,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Database error during {operation} of {key}: {source}")]
    Database {
        operation: &'static str,
        key: String,
        #[source]
        source: DbError,
    },

    #[error("Paste content for {0} is not valid UTF-8")]
    InvalidContent(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

impl CoreError {
    pub(crate) fn storage(operation: &'static str, key: &str, source: StorageError) -> Self {
        CoreError::Storage {
            operation,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn database(operation: &'static str, key: &str, source: DbError) -> Self {
        CoreError::Database {
            operation,
            key: key.to_string(),
            source,
        }
    }
}

/// Cache backend error types
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}
