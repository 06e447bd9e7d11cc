//! Provider adapters
//!
//! A provider is an adapter for one venue or chain that produces candidate
//! class records for a single invocation. The pipeline treats providers as
//! opaque producers: site quirks live in configuration data, not in new
//! types.

mod json_endpoint;

pub use json_endpoint::{build_http_client, JsonEndpointProvider};

use crate::record::ClassRecord;
use thiserror::Error;

/// Errors a provider can raise for a whole run
///
/// Any of these marks the owning scrape run as failed. Per-record problems
/// belong in `ScrapeOutput::errors` instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Provider failure: {0}")]
    Other(String),
}

/// Options passed to a single scrape invocation
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Cap on the number of candidate records to produce
    pub max_records: Option<usize>,
}

/// Everything a provider hands back for one invocation
///
/// `errors` are soft, per-record complaints (a row that would not parse, a
/// missing field on one entry); the run still completes. `failure` set
/// means the scrape aborted partway: the records gathered before the abort
/// are still ingested, but the run is marked failed and nothing is
/// uploaded. A `ProviderError` from `scrape` itself means the invocation
/// produced nothing at all.
#[derive(Debug, Default)]
pub struct ScrapeOutput {
    pub records: Vec<ClassRecord>,
    pub errors: Vec<String>,
    pub failure: Option<String>,
}

/// An external data source producing candidate class records
pub trait Provider {
    /// Name under which runs and stats are recorded for this provider
    fn name(&self) -> &str;

    /// Produces candidate records for one invocation
    fn scrape(
        &self,
        options: &ScrapeOptions,
    ) -> impl std::future::Future<Output = Result<ScrapeOutput, ProviderError>> + Send;
}
