//! Database repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::models::{NewPaste, Paste};

// Submodules
mod pastes;

/// Metadata store trait
///
/// The paste engine only talks to metadata through this trait, so any
/// relational backend can stand in for the SQLite `Database`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a paste record. Fails with `DbError::Duplicate` if the key exists.
    async fn insert(&self, paste: NewPaste) -> Result<Paste, DbError>;

    /// Find a paste record by key
    async fn find_by_key(&self, key: &str) -> Result<Option<Paste>, DbError>;

    /// Delete a paste record by key. Returns `false` if nothing was deleted.
    async fn delete_by_key(&self, key: &str) -> Result<bool, DbError>;

    /// List pastes whose end date is strictly before `date`
    async fn list_expired_before(&self, date: NaiveDate) -> Result<Vec<Paste>, DbError>;
}

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let pool = SqlitePool::connect(database_url).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pastes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                create_date TEXT NOT NULL,
                end_date TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_pastes_end_date ON pastes(end_date)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for Database {
    async fn insert(&self, paste: NewPaste) -> Result<Paste, DbError> {
        self.insert_paste(paste).await
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Paste>, DbError> {
        self.get_paste_by_key(key).await
    }

    async fn delete_by_key(&self, key: &str) -> Result<bool, DbError> {
        self.delete_paste(key).await
    }

    async fn list_expired_before(&self, date: NaiveDate) -> Result<Vec<Paste>, DbError> {
        self.get_pastes_ending_before(date).await
    }
}
