//! Storage module for persisting scrape data
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Scrape-run tracking (append-only history)
//! - Class-row persistence with the upload flag
//! - Per-provider aggregate statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, Store};

use crate::record::ClassRecord;
use crate::ClassfeedError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStore, ClassfeedError> {
    SqliteStore::new(path)
}

/// A scrape run as recorded in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub provider_name: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub classes_found: u32,
    pub classes_uploaded: u32,
    pub error_text: Option<String>,
}

/// A persisted class row: the record plus ownership and upload state
#[derive(Debug, Clone)]
pub struct StoredClass {
    pub id: i64,
    pub scrape_run_id: i64,
    pub record: ClassRecord,
    pub uploaded: bool,
    pub created_at: DateTime<Utc>,
}

/// Running aggregate for one provider
#[derive(Debug, Clone)]
pub struct ProviderStats {
    pub name: String,
    pub enabled: bool,
    pub last_scrape_time: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub total_classes_found: u64,
}

/// Status of a scrape run
///
/// `running -> {completed, failed}` and nothing else; both right-hand
/// states are terminal. Zero classes found is still a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }
}
