//! Rental-Scout: a polite apartment-listing scraper
//!
//! This crate periodically crawls rental index pages for a fixed set of
//! locations, extracts listing cards into structured records, and persists
//! them together with a summary of every run. Fetching is constrained by a
//! path-prefix policy and a crawl delay.

pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Rental-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid run state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("Source task for {source_name} aborted: {message}")]
    TaskAborted {
        source_name: String,
        message: String,
    },
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

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Transport failures reported by the page fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Timeout { url } | Self::Status { url, .. } => url,
        }
    }
}

/// Failures while turning a single listing card into a record
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Cannot resolve listing link '{href}': {reason}")]
    InvalidLink { href: String, reason: String },

    #[error("Cannot parse {field} from '{text}'")]
    InvalidNumber { field: &'static str, text: String },
}

/// Result type alias for Rental-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ListingSource, RunScheduler, SourceRun};
pub use policy::PolicyGate;
pub use state::RunState;
pub use storage::{ListingRecord, RunSummary};
