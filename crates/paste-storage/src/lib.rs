//! Pastebin Storage Layer
//!
//! This crate provides the blob store abstraction holding paste text,
//! supporting local disk and S3-compatible backends.

pub mod backend;
pub mod error;
pub mod local;
pub mod s3;

pub use backend::{validate_key, BlobStore};
pub use error::StorageError;
pub use local::LocalStorage;
pub use s3::{S3Config, S3Storage};
