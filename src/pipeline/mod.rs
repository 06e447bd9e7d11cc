//! Ingestion pipeline
//!
//! This module contains the per-run orchestration: candidate records flow
//! from a provider through validation and duplicate admission into the
//! local store, and accepted rows are forwarded to the backend in batches.

mod ingest;

pub use ingest::{ingest_records, run_provider, upload_pending};

use crate::storage::RunStatus;
use crate::upload::UploadReport;

/// Per-run admission tally
///
/// Invalid and duplicate candidates are dropped silently by design; the
/// tally makes those routine outcomes visible without turning them into
/// errors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestTally {
    pub accepted: u32,
    pub invalid: u32,
    pub duplicates: u32,
}

/// Final outcome of one provider run
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: i64,
    pub provider_name: String,
    pub status: RunStatus,
    pub tally: IngestTally,
    pub upload: UploadReport,
    pub error_text: Option<String>,
}
