//! Database models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Paste metadata record
///
/// The text itself is never stored here; it lives in the blob store
/// under the same key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paste {
    pub id: i64,
    pub key: String,
    pub create_date: NaiveDate,
    /// `None` means the paste never expires
    pub end_date: Option<NaiveDate>,
}

impl Paste {
    /// Whether the paste expired before `today`
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }
}

/// New paste record (for insertion)
#[derive(Debug, Clone)]
pub struct NewPaste {
    pub key: String,
    pub create_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for Paste {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Paste {
            id: row.try_get("id")?,
            key: row.try_get("key")?,
            create_date: row.try_get("create_date")?,
            end_date: row.try_get("end_date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paste(end_date: Option<NaiveDate>) -> Paste {
        Paste {
            id: 1,
            key: "abcdefgh20240101000000".to_string(),
            create_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date,
        }
    }

    #[test]
    fn test_is_expired() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(paste(NaiveDate::from_ymd_opt(2024, 5, 31)).is_expired(today));
        assert!(!paste(Some(today)).is_expired(today));
        assert!(!paste(NaiveDate::from_ymd_opt(2024, 6, 2)).is_expired(today));
        assert!(!paste(None).is_expired(today));
    }
}
