use crate::config::types::{
    CardSelectors, Config, PolicyConfig, RequestConfig, SchedulerConfig, SourceEntry,
    StorageConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::time::Duration;
use url::Url;

/// Placeholder substituted with each location token in `index-path`
pub const LOCATION_PLACEHOLDER: &str = "{location}";

/// Longest accepted scrape interval (one year)
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_policy_config(&config.policy)?;
    validate_request_config(&config.request)?;
    validate_storage_config(&config.storage)?;
    validate_sources(&config.sources)?;
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if !(1..=MAX_INTERVAL_HOURS).contains(&config.interval_hours) {
        return Err(ConfigError::Validation(format!(
            "interval_hours must be between 1 and {}, got {}",
            MAX_INTERVAL_HOURS, config.interval_hours
        )));
    }
    Ok(())
}

fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    if config.allowed_paths.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_paths must contain at least one path prefix".to_string(),
        ));
    }

    for prefix in config.allowed_paths.iter().chain(&config.disallowed_paths) {
        validate_path_prefix(prefix)?;
    }

    if Duration::try_from_secs_f64(config.crawl_delay).is_err() {
        return Err(ConfigError::Validation(format!(
            "crawl_delay must be a non-negative, representable number of seconds, got {}",
            config.crawl_delay
        )));
    }

    if config.jitter_min_ms > config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) cannot exceed jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    Ok(())
}

fn validate_path_prefix(prefix: &str) -> Result<(), ConfigError> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "Path prefix '{}' must start with '/'",
            prefix
        )));
    }
    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[source]] entry is required".to_string(),
        ));
    }

    for source in sources {
        validate_source(source)?;
    }

    Ok(())
}

fn validate_source(source: &SourceEntry) -> Result<(), ConfigError> {
    if source.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "Source name cannot be empty".to_string(),
        ));
    }

    let base = Url::parse(&source.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", source.base_url, e))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            source.base_url
        )));
    }

    if !source.index_path.starts_with('/') || !source.index_path.contains(LOCATION_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "index_path '{}' must start with '/' and contain '{}'",
            source.index_path, LOCATION_PLACEHOLDER
        )));
    }

    if source.locations.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' must list at least one location",
            source.name
        )));
    }

    for location in &source.locations {
        validate_location_token(location)?;
    }

    validate_selectors(&source.selectors)?;

    Ok(())
}

/// Validates a hyphen-delimited city-state token such as "san-francisco-ca"
fn validate_location_token(token: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::Validation(
            "Location token cannot be empty".to_string(),
        ));
    }

    if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "Location '{}' must contain only ASCII letters, digits and hyphens",
            token
        )));
    }

    if token.starts_with('-') || token.ends_with('-') || token.contains("--") {
        return Err(ConfigError::Validation(format!(
            "Location '{}' has an empty segment",
            token
        )));
    }

    Ok(())
}

fn validate_selectors(selectors: &CardSelectors) -> Result<(), ConfigError> {
    for css in [
        &selectors.card,
        &selectors.link,
        &selectors.price,
        &selectors.address,
        &selectors.details,
        &selectors.image,
    ] {
        Selector::parse(css)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", css, e)))?;
    }
    Ok(())
}
