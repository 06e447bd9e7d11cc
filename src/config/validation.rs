use crate::config::types::{BackendConfig, Config, ProviderEntry, StorageConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)?;
    validate_backend_config(&config.backend)?;
    validate_providers(&config.providers)?;
    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates backend upload configuration
fn validate_backend_config(config: &BackendConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.upload_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid upload_url: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "upload_url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if let Some(api_key) = &config.api_key {
        if api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api_key must not be blank when set".to_string(),
            ));
        }
    }

    if config.batch_size < 1 || config.batch_size > 500 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 500, got {}",
            config.batch_size
        )));
    }

    if config.batch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "batch_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates provider entries
fn validate_providers(providers: &[ProviderEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in providers {
        if entry.name.is_empty() {
            return Err(ConfigError::Validation(
                "provider name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider name '{}'",
                entry.name
            )));
        }

        Url::parse(&entry.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid endpoint for provider '{}': {e}",
                entry.name
            ))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            storage: StorageConfig {
                database_path: "./classes.db".to_string(),
            },
            backend: BackendConfig {
                upload_url: "https://api.example.com/v1/classes".to_string(),
                api_key: None,
                batch_size: 50,
                batch_timeout_secs: 30,
                batch_delay_ms: 1000,
            },
            providers: vec![ProviderEntry {
                name: "eastside".to_string(),
                endpoint: "https://eastside.example/api/schedule".to_string(),
                enabled: true,
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = base_config();
        config.storage.database_path = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_upload_url_rejected() {
        let mut config = base_config();
        config.backend.upload_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_upload_url_rejected() {
        let mut config = base_config();
        config.backend.upload_url = "ftp://api.example.com/classes".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let mut config = base_config();
        config.backend.api_key = Some("  ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = base_config();
        config.backend.batch_size = 0;
        assert!(validate(&config).is_err());

        config.backend.batch_size = 501;
        assert!(validate(&config).is_err());

        config.backend.batch_size = 500;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_provider_names_rejected() {
        let mut config = base_config();
        config.providers.push(ProviderEntry {
            name: "eastside".to_string(),
            endpoint: "https://other.example/api".to_string(),
            enabled: true,
        });
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_provider_endpoint_rejected() {
        let mut config = base_config();
        config.providers[0].endpoint = "::: nope".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_no_providers_is_allowed() {
        let mut config = base_config();
        config.providers.clear();
        // An upload-pending-only deployment has no providers configured
        assert!(validate(&config).is_ok());
    }
}
