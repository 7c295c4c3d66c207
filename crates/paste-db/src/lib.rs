//! Pastebin Database Layer
//!
//! This crate provides the metadata store for pastes,
//! using SQLite via sqlx for persistence.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, MetadataStore};

/// Re-export sqlx types for convenience
pub use sqlx::{Error as SqlxError, SqlitePool};
