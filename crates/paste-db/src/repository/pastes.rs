//! Paste record operations

use chrono::NaiveDate;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewPaste, Paste};

use super::Database;

impl Database {
    // ==================== Paste Operations ====================

    /// Insert a new paste record
    pub async fn insert_paste(&self, paste: NewPaste) -> Result<Paste, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO pastes (key, create_date, end_date)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&paste.key)
        .bind(paste.create_date)
        .bind(paste.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, &paste.key))?;

        let id: i64 = result.get("id");

        Ok(Paste {
            id,
            key: paste.key,
            create_date: paste.create_date,
            end_date: paste.end_date,
        })
    }

    /// Get a paste record by key
    pub async fn get_paste_by_key(&self, key: &str) -> Result<Option<Paste>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, key, create_date, end_date
            FROM pastes
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Paste::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Delete a paste record by key
    pub async fn delete_paste(&self, key: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM pastes WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get pastes whose end date is strictly before `date`, oldest first.
    /// Pastes without an end date never match.
    pub async fn get_pastes_ending_before(&self, date: NaiveDate) -> Result<Vec<Paste>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, create_date, end_date
            FROM pastes
            WHERE end_date IS NOT NULL AND end_date < ?
            ORDER BY end_date ASC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Paste::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get paste count
    pub async fn get_paste_count(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM pastes")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}
