use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that run summaries can be correlated with the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG: &str = r#"
[scheduler]
interval-hours = 24

[policy]
allowed-paths = ["/homes/for_rent/", "/homes/for_sale/", "/apartments/"]
disallowed-paths = ["/homedetails/", "/myzillow/", "/profile/"]
crawl-delay = 5

[storage]
database-path = "./listings.db"

[[source]]
name = "zillow.com"
base-url = "https://www.zillow.com"
index-path = "/homes/for_rent/{location}/"
locations = ["san-francisco-ca", "miami-fl"]
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scheduler.interval_hours, 24);
        assert_eq!(config.policy.allowed_paths.len(), 3);
        assert_eq!(config.policy.disallowed_paths[0], "/homedetails/");
        assert_eq!(config.policy.crawl_delay, 5.0);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].locations, vec!["san-francisco-ca", "miami-fl"]);
    }

    #[test]
    fn test_defaults_are_applied() {
        let config = parse_config(VALID_CONFIG).unwrap();

        assert_eq!(config.policy.jitter_min_ms, 500);
        assert_eq!(config.policy.jitter_max_ms, 1500);
        assert_eq!(config.request.timeout_secs, 30);
        assert!(config.request.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.sources[0].selectors.card, ".list-card");
        assert_eq!(config.sources[0].selectors.image, ".list-card-img");
    }

    #[test]
    fn test_custom_selectors() {
        let content = format!(
            "{}\n[source.selectors]\ncard = \"article.property\"\n",
            VALID_CONFIG
        );
        let config = parse_config(&content).unwrap();
        assert_eq!(config.sources[0].selectors.card, "article.property");
        assert_eq!(config.sources[0].selectors.link, ".list-card-link");
    }

    #[test]
    fn test_shipped_sample_config_is_valid() {
        let config = parse_config(include_str!("../../scout.example.toml")).unwrap();
        assert_eq!(config.scheduler.interval_hours, 24);
        assert_eq!(config.sources[0].locations.len(), 5);
        assert_eq!(config.policy.disallowed_paths.len(), 6);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scout.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("interval-hours = 24", "interval-hours = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unrepresentable_crawl_delay_is_rejected() {
        let content = VALID_CONFIG.replace("crawl-delay = 5", "crawl-delay = 1e30");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_interval_beyond_one_year_is_rejected() {
        let content = VALID_CONFIG.replace("interval-hours = 24", "interval-hours = 9000");
        assert!(matches!(
            parse_config(&content),
            Err(ConfigError::Validation(_))
        ));

        let content = VALID_CONFIG.replace("interval-hours = 24", "interval-hours = 8760");
        assert!(parse_config(&content).is_ok());
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
