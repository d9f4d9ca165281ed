//! Configuration module for Rental-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use rental_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Scraping every {} hours", config.scheduler.interval_hours);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CardSelectors, Config, PolicyConfig, RequestConfig, SchedulerConfig, SourceEntry,
    StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::LOCATION_PLACEHOLDER;
