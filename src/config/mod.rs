//! Configuration loading and validation
//!
//! Configuration is a TOML file describing the local store, the backend
//! upload endpoint, and the providers to scrape. The file's SHA-256 hash
//! is computed at load time for run provenance.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{BackendConfig, Config, ProviderEntry, StorageConfig};
pub use validation::validate;
