use serde::Deserialize;

/// Main configuration structure for classfeed
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub backend: BackendConfig,
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderEntry>,
}

/// Local store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Backend upload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Full URL of the class upload endpoint
    #[serde(rename = "upload-url")]
    pub upload_url: String,

    /// Bearer token sent with upload requests, if the backend requires one
    #[serde(default, rename = "api-key")]
    pub api_key: Option<String>,

    /// Records per upload batch
    #[serde(default = "default_batch_size", rename = "batch-size")]
    pub batch_size: usize,

    /// Per-batch request timeout in seconds
    #[serde(default = "default_batch_timeout", rename = "batch-timeout-secs")]
    pub batch_timeout_secs: u64,

    /// Fixed delay between batches in milliseconds
    #[serde(default = "default_batch_delay", rename = "batch-delay-ms")]
    pub batch_delay_ms: u64,
}

fn default_batch_size() -> usize {
    crate::upload::DEFAULT_BATCH_SIZE
}

fn default_batch_timeout() -> u64 {
    30
}

fn default_batch_delay() -> u64 {
    1000
}

/// One provider to scrape: everything site-specific is data
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    /// Name under which runs and stats are recorded
    pub name: String,

    /// JSON schedule endpoint for this provider
    pub endpoint: String,

    /// Disabled providers are skipped without recording a run
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
