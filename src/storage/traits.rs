//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::ClassRecord;
use crate::storage::{ProviderStats, RunRecord, StoredClass};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the ingestion
/// pipeline. The workload is single-writer; implementations need no
/// concurrent-transaction discipline.
pub trait Store {
    // ===== Run tracking =====

    /// Creates a new scrape run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `provider_name` - The provider this run belongs to
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, provider_name: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Transitions a run to its terminal state with final counts
    ///
    /// Callers must not complete the same run twice; a second call is
    /// last-write-wins, not an error.
    fn complete_run(
        &mut self,
        run_id: i64,
        success: bool,
        found: u32,
        uploaded: u32,
        error_text: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Class rows =====

    /// Persists one class row owned by the given run, with uploaded=false
    ///
    /// The store enforces no uniqueness; duplicate admission is the
    /// caller's responsibility via `is_duplicate`.
    fn insert_class(&mut self, run_id: i64, record: &ClassRecord) -> StorageResult<i64>;

    /// Checks whether a record with this identity already exists
    ///
    /// Matches on exact (provider_record_id, start_time) equality over all
    /// historical rows, not scoped to the current run.
    fn is_duplicate(
        &self,
        provider_record_id: &str,
        start_time: &DateTime<Utc>,
    ) -> StorageResult<bool>;

    /// Gets rows not yet uploaded, oldest-first, optionally capped
    fn unuploaded_classes(&self, limit: Option<u32>) -> StorageResult<Vec<StoredClass>>;

    /// Batch-flips the uploaded flag for the given ids
    ///
    /// No-op for empty input; idempotent on already-uploaded rows.
    fn mark_uploaded(&mut self, class_ids: &[i64]) -> StorageResult<()>;

    // ===== Provider stats =====

    /// Ensures a stats row exists for the provider
    fn upsert_provider_stats(&mut self, name: &str) -> StorageResult<()>;

    /// Accumulates run totals for the provider
    ///
    /// Sets `last_scrape_time` to now; `successful_runs` and
    /// `total_classes_found` only ever increase.
    fn update_provider_stats(&mut self, name: &str, success: bool, found: u32)
        -> StorageResult<()>;

    /// Gets stats for one provider, if recorded
    fn get_provider_stats(&self, name: &str) -> StorageResult<Option<ProviderStats>>;

    /// Lists stats for all known providers, sorted by name
    fn all_provider_stats(&self) -> StorageResult<Vec<ProviderStats>>;

    // ===== Counts (CLI stats) =====

    /// Total number of scrape runs recorded
    fn count_runs(&self) -> StorageResult<u64>;

    /// Total number of class rows stored
    fn count_classes(&self) -> StorageResult<u64>;

    /// Number of class rows still awaiting upload
    fn count_unuploaded(&self) -> StorageResult<u64>;
}
