//! Classfeed: a fitness-class schedule ingestion pipeline
//!
//! This crate ingests candidate class records from provider adapters,
//! validates and deduplicates them, persists them locally, and forwards
//! accepted records to a backend service in bounded batches.

pub mod config;
pub mod pipeline;
pub mod provider;
pub mod record;
pub mod storage;
pub mod upload;

use thiserror::Error;

/// Main error type for classfeed operations
#[derive(Debug, Error)]
pub enum ClassfeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Provider error for {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for classfeed operations
pub type Result<T> = std::result::Result<T, ClassfeedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{BookingStatus, ClassRecord, Enrichment, Location};
pub use storage::{RunStatus, SqliteStore, Store};
pub use upload::UploadReport;
