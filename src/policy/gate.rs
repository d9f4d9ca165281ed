//! Path-prefix fetch policy
//!
//! Evaluates candidate URLs against an ordered allow list and a deny list
//! taken from the site's published crawl rules.

use crate::config::PolicyConfig;
use std::time::Duration;
use url::Url;

/// Immutable ruleset deciding which URLs may be fetched
#[derive(Debug, Clone)]
pub struct PolicyGate {
    allowed: Vec<String>,
    disallowed: Vec<String>,
    crawl_delay: Duration,
}

impl PolicyGate {
    /// Creates a gate from explicit prefix lists and a crawl delay
    pub fn new(allowed: Vec<String>, disallowed: Vec<String>, crawl_delay: Duration) -> Self {
        Self {
            allowed,
            disallowed,
            crawl_delay,
        }
    }

    /// Builds the gate from validated policy configuration
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            config.allowed_paths.clone(),
            config.disallowed_paths.clone(),
            Duration::from_secs_f64(config.crawl_delay),
        )
    }

    /// Minimum wait between consecutive fetches to the same source
    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }

    /// Checks whether a URL may be fetched
    ///
    /// The path must start with at least one allowed prefix and with none of
    /// the disallowed prefixes. Absolute URLs are reduced to their path;
    /// bare paths such as `/homes/for_rent/` are accepted as-is. Anything
    /// that is neither is rejected.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Some(path) = extract_path(url) else {
            return false;
        };

        for allowed in &self.allowed {
            if path.starts_with(allowed.as_str()) {
                return !self
                    .disallowed
                    .iter()
                    .any(|disallowed| path.starts_with(disallowed.as_str()));
            }
        }

        false
    }
}

/// Decomposes a URL (or bare path) into its path component
fn extract_path(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed.path().to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) if url.starts_with('/') => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            Some(url[..end].to_string())
        }
        Err(_) => None,
    }
}
