use crate::config::types::{Config, FetchConfig, OutputConfig, SourceEntry};
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
///
/// Only problems that make the whole run meaningless are rejected here.
/// Per-source option errors are deferred to the registry so that one bad
/// catalog entry cannot block the other sources.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_concurrent_sources < 1 || config.max_concurrent_sources > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-sources must be between 1 and 64, got {}",
            config.max_concurrent_sources
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be a finite number >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    if let Some(cap) = config.max_backoff_ms {
        if cap < config.retry_backoff_ms {
            return Err(ConfigError::Validation(format!(
                "max-backoff-ms ({}) must be >= retry-backoff-ms ({})",
                cap, config.retry_backoff_ms
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.index_path.is_empty() {
        return Err(ConfigError::Validation(
            "index-path cannot be empty".to_string(),
        ));
    }

    if config.seen_db_path.is_empty() {
        return Err(ConfigError::Validation(
            "seen-db-path cannot be empty".to_string(),
        ));
    }

    if matches!(config.items_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "items-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates catalog identity: ids must be present and unique
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in sources {
        if entry.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has an empty id",
                entry.name
            )));
        }

        if !seen.insert(entry.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id '{}'",
                entry.id
            )));
        }
    }

    Ok(())
}
