//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::record::{ClassRecord, Enrichment, Location};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageResult, Store};
use crate::storage::{ProviderStats, RunRecord, RunStatus, StoredClass};
use crate::ClassfeedError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

const CLASS_COLUMNS: &str = "id, scrape_run_id, provider_record_id, provider_name, name, \
     description, start_time, location_name, location_address, latitude, longitude, trainer, \
     intensity, price, booking_url, capacity, tags, enrichment, uploaded, created_at";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, ClassfeedError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, ClassfeedError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn conversion_err(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

fn map_class_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredClass> {
    let start_time: String = row.get(6)?;
    let start_time = start_time
        .parse::<DateTime<Utc>>()
        .map_err(|e| conversion_err(6, e))?;

    let tags_json: String = row.get(16)?;
    let tags: BTreeSet<String> =
        serde_json::from_str(&tags_json).map_err(|e| conversion_err(16, e))?;

    let enrichment_json: Option<String> = row.get(17)?;
    let enrichment: Option<Enrichment> = match enrichment_json {
        Some(json) => Some(serde_json::from_str(&json).map_err(|e| conversion_err(17, e))?),
        None => None,
    };

    let created_at: String = row.get(19)?;
    let created_at = created_at
        .parse::<DateTime<Utc>>()
        .map_err(|e| conversion_err(19, e))?;

    Ok(StoredClass {
        id: row.get(0)?,
        scrape_run_id: row.get(1)?,
        record: ClassRecord {
            provider_record_id: row.get(2)?,
            provider_name: row.get(3)?,
            name: row.get(4)?,
            description: row.get(5)?,
            start_time,
            location: Location {
                name: row.get(7)?,
                address: row.get(8)?,
                latitude: row.get(9)?,
                longitude: row.get(10)?,
            },
            trainer: row.get(11)?,
            intensity: row.get(12)?,
            price: row.get(13)?,
            booking_url: row.get(14)?,
            capacity: row.get(15)?,
            tags,
            enrichment,
        },
        uploaded: row.get::<_, i64>(18)? != 0,
        created_at,
    })
}

impl Store for SqliteStore {
    // ===== Run tracking =====

    fn create_run(&mut self, provider_name: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scrape_runs (provider_name, started_at, status) VALUES (?1, ?2, ?3)",
            params![provider_name, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, provider_name, started_at, finished_at, status, classes_found,
             classes_uploaded, error_text FROM scrape_runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    provider_name: row.get(1)?,
                    started_at: row.get(2)?,
                    finished_at: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                    classes_found: row.get(5)?,
                    classes_uploaded: row.get(6)?,
                    error_text: row.get(7)?,
                })
            })
            .optional()?
            .ok_or(crate::storage::StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        success: bool,
        found: u32,
        uploaded: u32,
        error_text: Option<&str>,
    ) -> StorageResult<()> {
        let status = if success {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE scrape_runs SET status = ?1, finished_at = ?2, classes_found = ?3,
             classes_uploaded = ?4, error_text = ?5 WHERE id = ?6",
            params![status.to_db_string(), now, found, uploaded, error_text, run_id],
        )?;
        Ok(())
    }

    // ===== Class rows =====

    fn insert_class(&mut self, run_id: i64, record: &ClassRecord) -> StorageResult<i64> {
        let tags_json = serde_json::to_string(&record.tags)?;
        let enrichment_json = match &record.enrichment {
            Some(enrichment) => Some(serde_json::to_string(enrichment)?),
            None => None,
        };
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO classes (scrape_run_id, provider_record_id, provider_name, name,
             description, start_time, location_name, location_address, latitude, longitude,
             trainer, intensity, price, booking_url, capacity, tags, enrichment, uploaded,
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
             ?17, 0, ?18)",
            params![
                run_id,
                record.provider_record_id,
                record.provider_name,
                record.name,
                record.description,
                record.start_time.to_rfc3339(),
                record.location.name,
                record.location.address,
                record.location.latitude,
                record.location.longitude,
                record.trainer,
                record.intensity,
                record.price,
                record.booking_url,
                record.capacity,
                tags_json,
                enrichment_json,
                now,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn is_duplicate(
        &self,
        provider_record_id: &str,
        start_time: &DateTime<Utc>,
    ) -> StorageResult<bool> {
        // Exact timestamp equality over the full history. A re-rendered
        // timestamp (different precision, same instant printed differently)
        // does not match.
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM classes WHERE provider_record_id = ?1 AND start_time = ?2",
            params![provider_record_id, start_time.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn unuploaded_classes(&self, limit: Option<u32>) -> StorageResult<Vec<StoredClass>> {
        let query = format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE uploaded = 0 ORDER BY id ASC LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&query)?;

        let limit = limit.map(i64::from).unwrap_or(-1);
        let classes = stmt
            .query_map(params![limit], map_class_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(classes)
    }

    fn mark_uploaded(&mut self, class_ids: &[i64]) -> StorageResult<()> {
        if class_ids.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE classes SET uploaded = 1 WHERE id = ?1")?;
            for id in class_ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Provider stats =====

    fn upsert_provider_stats(&mut self, name: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO provider_stats (name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    fn update_provider_stats(
        &mut self,
        name: &str,
        success: bool,
        found: u32,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO provider_stats (name, last_scrape_time, total_runs, successful_runs,
             total_classes_found)
             VALUES (?1, ?2, 1, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                 last_scrape_time = excluded.last_scrape_time,
                 total_runs = total_runs + 1,
                 successful_runs = successful_runs + excluded.successful_runs,
                 total_classes_found = total_classes_found + excluded.total_classes_found",
            params![name, now, if success { 1 } else { 0 }, found],
        )?;
        Ok(())
    }

    fn get_provider_stats(&self, name: &str) -> StorageResult<Option<ProviderStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, enabled, last_scrape_time, total_runs, successful_runs,
             total_classes_found FROM provider_stats WHERE name = ?1",
        )?;

        let stats = stmt
            .query_row(params![name], map_stats_row)
            .optional()?;

        Ok(stats)
    }

    fn all_provider_stats(&self) -> StorageResult<Vec<ProviderStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, enabled, last_scrape_time, total_runs, successful_runs,
             total_classes_found FROM provider_stats ORDER BY name",
        )?;

        let stats = stmt
            .query_map([], map_stats_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    // ===== Counts =====

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scrape_runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_classes(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM classes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_unuploaded(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM classes WHERE uploaded = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn map_stats_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProviderStats> {
    let last_scrape_time: Option<String> = row.get(2)?;
    let last_scrape_time = match last_scrape_time {
        Some(ts) => Some(
            ts.parse::<DateTime<Utc>>()
                .map_err(|e| conversion_err(2, e))?,
        ),
        None => None,
    };

    Ok(ProviderStats {
        name: row.get(0)?,
        enabled: row.get::<_, i64>(1)? != 0,
        last_scrape_time,
        total_runs: row.get::<_, i64>(3)? as u64,
        successful_runs: row.get::<_, i64>(4)? as u64,
        total_classes_found: row.get::<_, i64>(5)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BookingStatus, Enrichment, PricingTier};
    use chrono::TimeZone;

    fn sample_record(provider_record_id: &str, hour: u32) -> ClassRecord {
        ClassRecord {
            name: "HIIT Express".to_string(),
            description: "30-minute interval training".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 4, 2, hour, 0, 0).unwrap(),
            location: Location {
                name: "Eastside Gym".to_string(),
                address: "88 Oak Ave".to_string(),
                latitude: 40.71,
                longitude: -74.0,
            },
            trainer: "Jordan".to_string(),
            intensity: 9,
            price: 18.0,
            booking_url: "https://example.com/book/hiit".to_string(),
            provider_record_id: provider_record_id.to_string(),
            provider_name: "eastside".to_string(),
            capacity: 16,
            tags: BTreeSet::from(["hiit".to_string(), "cardio".to_string()]),
            enrichment: None,
        }
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStore::new_in_memory().is_ok());
    }

    #[test]
    fn test_create_run() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();
        assert!(run_id > 0);

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.provider_name, "eastside");
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_get_missing_run() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.get_run(999).is_err());
    }

    #[test]
    fn test_complete_run_terminal() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        store.complete_run(run_id, true, 12, 10, None).unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.classes_found, 12);
        assert_eq!(run.classes_uploaded, 10);
        assert!(run.finished_at.is_some());
        assert!(run.error_text.is_none());
    }

    #[test]
    fn test_complete_run_failed_with_error_text() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        store
            .complete_run(run_id, false, 3, 0, Some("schedule page timed out"))
            .unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_text.as_deref(), Some("schedule page timed out"));
    }

    #[test]
    fn test_insert_and_roundtrip_class() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        let mut record = sample_record("hiit-0700", 7);
        record.enrichment = Some(Enrichment {
            photo_urls: vec!["https://example.com/room.jpg".to_string()],
            trainer_bio: Some("10 years coaching".to_string()),
            trainer_photo_url: None,
            amenities: vec!["showers".to_string()],
            spots_remaining: Some(4),
            booking_status: Some(BookingStatus::Open),
            availability_checked_at: Some(Utc.with_ymd_and_hms(2026, 4, 1, 20, 0, 0).unwrap()),
            pricing_tiers: vec![PricingTier {
                label: "drop-in".to_string(),
                price: 18.0,
                sessions: None,
            }],
        });

        let class_id = store.insert_class(run_id, &record).unwrap();
        assert!(class_id > 0);

        let pending = store.unuploaded_classes(None).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, class_id);
        assert_eq!(pending[0].scrape_run_id, run_id);
        assert!(!pending[0].uploaded);
        assert_eq!(pending[0].record, record);
    }

    #[test]
    fn test_is_duplicate_exact_identity() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        let record = sample_record("hiit-0700", 7);
        assert!(!store
            .is_duplicate(&record.provider_record_id, &record.start_time)
            .unwrap());

        store.insert_class(run_id, &record).unwrap();
        assert!(store
            .is_duplicate(&record.provider_record_id, &record.start_time)
            .unwrap());
    }

    #[test]
    fn test_same_id_different_time_not_duplicate() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        let morning = sample_record("hiit-recurring", 7);
        store.insert_class(run_id, &morning).unwrap();

        let evening = sample_record("hiit-recurring", 19);
        assert!(!store
            .is_duplicate(&evening.provider_record_id, &evening.start_time)
            .unwrap());

        // One-millisecond differences are distinct identities too
        let mut shifted = morning.clone();
        shifted.start_time = morning.start_time + chrono::Duration::milliseconds(1);
        assert!(!store
            .is_duplicate(&shifted.provider_record_id, &shifted.start_time)
            .unwrap());
    }

    #[test]
    fn test_unuploaded_oldest_first_with_limit() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        for hour in 6..10 {
            store
                .insert_class(run_id, &sample_record(&format!("c-{hour}"), hour))
                .unwrap();
        }

        let capped = store.unuploaded_classes(Some(2)).unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].record.provider_record_id, "c-6");
        assert_eq!(capped[1].record.provider_record_id, "c-7");
    }

    #[test]
    fn test_mark_uploaded_removes_from_pending() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();

        let a = store.insert_class(run_id, &sample_record("a", 7)).unwrap();
        let b = store.insert_class(run_id, &sample_record("b", 8)).unwrap();

        store.mark_uploaded(&[a]).unwrap();

        let pending = store.unuploaded_classes(None).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b);
        assert_eq!(store.count_unuploaded().unwrap(), 1);

        // Idempotent on already-uploaded rows, no-op on empty input
        store.mark_uploaded(&[a]).unwrap();
        store.mark_uploaded(&[]).unwrap();
        assert_eq!(store.count_unuploaded().unwrap(), 1);
    }

    #[test]
    fn test_provider_stats_accumulate() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store.upsert_provider_stats("eastside").unwrap();
        let stats = store.get_provider_stats("eastside").unwrap().unwrap();
        assert!(stats.enabled);
        assert_eq!(stats.total_runs, 0);
        assert!(stats.last_scrape_time.is_none());

        store.update_provider_stats("eastside", true, 12).unwrap();
        store.update_provider_stats("eastside", false, 0).unwrap();
        store.update_provider_stats("eastside", true, 8).unwrap();

        let stats = store.get_provider_stats("eastside").unwrap().unwrap();
        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.successful_runs, 2);
        assert_eq!(stats.total_classes_found, 20);
        assert!(stats.last_scrape_time.is_some());
    }

    #[test]
    fn test_all_provider_stats_sorted() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.update_provider_stats("zen-loft", true, 1).unwrap();
        store.update_provider_stats("eastside", true, 2).unwrap();

        let all = store.all_provider_stats().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "eastside");
        assert_eq!(all[1].name, "zen-loft");
    }

    #[test]
    fn test_counts() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("eastside").unwrap();
        store.insert_class(run_id, &sample_record("a", 7)).unwrap();
        store.insert_class(run_id, &sample_record("b", 8)).unwrap();

        assert_eq!(store.count_runs().unwrap(), 1);
        assert_eq!(store.count_classes().unwrap(), 2);
        assert_eq!(store.count_unuploaded().unwrap(), 2);
    }
}
