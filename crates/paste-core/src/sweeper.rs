//! Scheduled expiry sweep
//!
//! Finds pastes whose end date is before today and deletes them one by
//! one through the engine. A failed deletion is recorded and the sweep
//! moves on to the next paste.

use chrono::{DateTime, NaiveDate, Utc};
use paste_db::MetadataStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::PasteEngine;
use crate::error::CoreError;

/// Daily at 03:00 UTC
pub const DEFAULT_SCHEDULE: &str = "0 0 3 * * *";

/// Cron schedule for the sweep task
pub struct SweepSchedule {
    expression: String,
    cron: croner::Cron,
}

impl SweepSchedule {
    /// Parse a cron expression with five fields, or six with leading seconds
    pub fn parse(expression: &str) -> Result<Self, CoreError> {
        let cron = croner::Cron::new(expression)
            .with_seconds_optional()
            .parse()
            .map_err(|e| CoreError::InvalidSchedule(format!("{}: {}", expression, e)))?;

        Ok(Self {
            expression: expression.to_string(),
            cron,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next firing time strictly after `after`
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron.find_next_occurrence(after, false).ok()
    }
}

/// A paste the sweep failed to delete
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Expired pastes found
    pub scanned: usize,
    /// Pastes deleted
    pub deleted: usize,
    pub failures: Vec<SweepFailure>,
}

/// Removes expired pastes
pub struct ExpirySweeper {
    engine: Arc<PasteEngine>,
    metadata: Arc<dyn MetadataStore>,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<PasteEngine>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { engine, metadata }
    }

    /// Sweep pastes that expired before today (UTC)
    pub async fn run_once(&self) -> Result<SweepReport, CoreError> {
        self.sweep(Utc::now().date_naive()).await
    }

    /// Delete every paste whose end date is strictly before `today`.
    ///
    /// Only a failure to list expired pastes aborts the sweep; individual
    /// delete failures end up in the report.
    pub async fn sweep(&self, today: NaiveDate) -> Result<SweepReport, CoreError> {
        let expired = self
            .metadata
            .list_expired_before(today)
            .await
            .map_err(|e| CoreError::database("list expired", &today.to_string(), e))?;

        let mut report = SweepReport {
            scanned: expired.len(),
            ..Default::default()
        };

        for paste in expired {
            debug!("Sweeping expired paste {} (ended {:?})", paste.key, paste.end_date);

            match self.engine.delete(&paste.key).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("Failed to delete expired paste {}: {}", paste.key, e);
                    report.failures.push(SweepFailure {
                        key: paste.key,
                        error: e.to_string(),
                    });
                }
            }
        }

        metrics::counter!("pastebin_sweep_deleted_total").increment(report.deleted as u64);
        metrics::counter!("pastebin_sweep_failures_total").increment(report.failures.len() as u64);

        info!(
            "Expiry sweep before {}: {} expired, {} deleted, {} failed",
            today,
            report.scanned,
            report.deleted,
            report.failures.len()
        );

        Ok(report)
    }
}

/// Spawn a background task that runs the sweep on `schedule`
pub fn spawn_sweep_task(
    sweeper: Arc<ExpirySweeper>,
    schedule: SweepSchedule,
) -> tokio::task::JoinHandle<()> {
    info!(
        "Starting background expiry sweep task (schedule: {})",
        schedule.expression()
    );

    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = schedule.next_after(&now) else {
                warn!(
                    "Sweep schedule {} has no future occurrence, stopping",
                    schedule.expression()
                );
                break;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            debug!("Next expiry sweep at {} (in {:?})", next, wait);
            tokio::time::sleep(wait).await;

            info!("Running scheduled expiry sweep");
            if let Err(e) = sweeper.run_once().await {
                warn!("Error during scheduled expiry sweep: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachePolicy, MemoryCache};
    use crate::keygen::KeyGenerator;
    use crate::testing::{CountingBlobStore, MemoryMetadataStore};
    use bytes::Bytes;
    use chrono::TimeZone;
    use paste_db::NewPaste;
    use paste_storage::BlobStore;

    struct Fixture {
        sweeper: ExpirySweeper,
        engine: Arc<PasteEngine>,
        metadata: Arc<MemoryMetadataStore>,
        blobs: Arc<CountingBlobStore>,
    }

    fn fixture() -> Fixture {
        let metadata = Arc::new(MemoryMetadataStore::default());
        let blobs = Arc::new(CountingBlobStore::default());
        let engine = Arc::new(PasteEngine::new(
            metadata.clone(),
            blobs.clone(),
            Arc::new(MemoryCache::new()),
            KeyGenerator::default(),
            CachePolicy::default(),
        ));
        let sweeper = ExpirySweeper::new(engine.clone(), metadata.clone());
        Fixture {
            sweeper,
            engine,
            metadata,
            blobs,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Store a paste directly, bypassing end date validation
    async fn seed(f: &Fixture, key: &str, end_date: Option<NaiveDate>) {
        f.blobs
            .put(key, Bytes::from_static(b"seeded"))
            .await
            .unwrap();
        f.metadata
            .insert(NewPaste {
                key: key.to_string(),
                create_date: date(2020, 1, 1),
                end_date,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_past_dated() {
        let f = fixture();
        let saved_on = date(2024, 6, 1);
        let expired = f
            .engine
            .save_on("expired", Some(date(2030, 1, 1)), saved_on)
            .await
            .unwrap();
        let live = f
            .engine
            .save_on("live", Some(date(2040, 1, 1)), saved_on)
            .await
            .unwrap();
        let forever = f.engine.save_on("forever", None, saved_on).await.unwrap();

        let report = f.sweeper.sweep(date(2035, 6, 1)).await.unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.deleted, 1);
        assert!(report.failures.is_empty());

        assert!(f.engine.fetch(&expired).await.unwrap().is_none());
        assert!(!f.blobs.contains(&expired));
        assert_eq!(f.engine.fetch(&live).await.unwrap().unwrap().text, "live");
        assert_eq!(f.engine.fetch(&forever).await.unwrap().unwrap().text, "forever");
    }

    #[tokio::test]
    async fn test_paste_ending_today_survives() {
        let f = fixture();
        seed(&f, "endsToday0020240101000000", Some(date(2024, 6, 1))).await;
        seed(&f, "endedYday0020240101000000", Some(date(2024, 5, 31))).await;

        let report = f.sweeper.sweep(date(2024, 6, 1)).await.unwrap();

        assert_eq!(report.deleted, 1);
        assert!(f.blobs.contains("endsToday0020240101000000"));
        assert!(!f.blobs.contains("endedYday0020240101000000"));
    }

    #[tokio::test]
    async fn test_sweep_continues_after_failure() {
        let f = fixture();
        seed(&f, "first00000020240101000000", Some(date(2024, 1, 2))).await;
        seed(&f, "second0000020240101000000", Some(date(2024, 1, 3))).await;
        seed(&f, "third00000020240101000000", Some(date(2024, 1, 4))).await;
        f.blobs.fail_delete_of("second0000020240101000000");

        let report = f.sweeper.sweep(date(2024, 2, 1)).await.unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, "second0000020240101000000");

        assert!(!f.blobs.contains("first00000020240101000000"));
        assert!(!f.blobs.contains("third00000020240101000000"));
        assert_eq!(f.metadata.len(), 0);
    }

    #[tokio::test]
    async fn test_run_once_with_nothing_expired() {
        let f = fixture();
        f.engine.save("text", None).await.unwrap();

        let report = f.sweeper.run_once().await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.deleted, 0);
    }

    #[test]
    fn test_default_schedule_fires_daily_at_three() {
        let schedule = SweepSchedule::parse(DEFAULT_SCHEDULE).unwrap();

        let morning = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(&morning),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap())
        );

        let afternoon = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(&afternoon),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_seconds_field_is_optional() {
        let with_seconds = SweepSchedule::parse("0 0 3 * * *").unwrap();
        let without = SweepSchedule::parse("0 3 * * *").unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();

        assert_eq!(with_seconds.next_after(&from), without.next_after(&from));
    }

    #[test]
    fn test_invalid_schedule() {
        assert!(matches!(
            SweepSchedule::parse("not a cron"),
            Err(CoreError::InvalidSchedule(_))
        ));
    }
}
