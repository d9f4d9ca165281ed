//! Listing sources
//!
//! A `ListingSource` is anything that can produce the listings of one site
//! for one run. `RentalIndexScraper` is the index-page implementation: it
//! walks the configured locations in order, pacing and policy-checking every
//! fetch, and extracts listing cards from each index page.

use crate::config::{Config, SourceEntry, LOCATION_PLACEHOLDER};
use crate::crawler::{ListingExtractor, Pacer, PageFetcher};
use crate::policy::PolicyGate;
use crate::storage::ListingRecord;
use crate::{ConfigError, ScoutError};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Capability of producing the listings of one source
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Name stamped on records and run summaries
    fn source_name(&self) -> &str;

    /// Scrapes every configured location and returns what was found
    ///
    /// Per-location problems (disallowed index, failed fetch, broken card)
    /// are logged and skipped. An `Err` means the run as a whole failed.
    async fn scrape(&self) -> Result<Vec<ListingRecord>, ScoutError>;
}

/// Scrapes a site's per-location rental index pages
pub struct RentalIndexScraper {
    name: String,
    base_url: Url,
    index_path: String,
    locations: Vec<String>,
    gate: Arc<PolicyGate>,
    fetcher: PageFetcher,
    pacer: Pacer,
    extractor: ListingExtractor,
}

impl RentalIndexScraper {
    /// Creates a scraper for one configured source
    ///
    /// # Arguments
    ///
    /// * `entry` - The source's configuration
    /// * `gate` - Policy consulted before every fetch
    /// * `fetcher` - Transport used for index pages
    /// * `pacer` - Delay settings for this source's fetch loop
    pub fn new(
        entry: &SourceEntry,
        gate: Arc<PolicyGate>,
        fetcher: PageFetcher,
        pacer: Pacer,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&entry.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", entry.base_url, e)))?;

        let extractor =
            ListingExtractor::new(&entry.name, base_url.clone(), &entry.selectors, gate.clone())?;

        Ok(Self {
            name: entry.name.clone(),
            base_url,
            index_path: entry.index_path.clone(),
            locations: entry.locations.clone(),
            gate,
            fetcher,
            pacer,
            extractor,
        })
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Builds the index page URL for one location token
    pub fn index_url(&self, location: &str) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&self.index_path.replace(LOCATION_PLACEHOLDER, location))
    }

    /// Index URLs for every location, with the policy decision for each
    pub fn planned_fetches(&self) -> Vec<(Url, bool)> {
        self.locations
            .iter()
            .filter_map(|location| self.index_url(location).ok())
            .map(|url| {
                let allowed = self.gate.is_allowed(url.as_str());
                (url, allowed)
            })
            .collect()
    }
}

#[async_trait]
impl ListingSource for RentalIndexScraper {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Result<Vec<ListingRecord>, ScoutError> {
        let mut listings = Vec::new();

        for location in &self.locations {
            self.pacer.before_fetch().await;

            let url = self.index_url(location)?;
            if !self.gate.is_allowed(url.as_str()) {
                tracing::warn!("URL {} is not allowed by crawl policy. Skipping.", url);
                continue;
            }

            tracing::info!("Scraping {}", url);
            let markup = match self.fetcher.fetch(url.as_str()).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::error!("Error scraping {}: {}", location, e);
                    continue;
                }
            };

            let records = self.extractor.extract(&markup, location);
            tracing::info!("Found {} listings for {}", records.len(), location);

            for record in records {
                listings.push(record);
                self.pacer.between_items().await;
            }
        }

        Ok(listings)
    }
}

/// Builds one scraper per configured source
///
/// All sources share the policy gate and the HTTP client, so they form a
/// single pacing stream when run sequentially.
pub fn sources_from_config(config: &Config) -> Result<Vec<Arc<dyn ListingSource>>, ScoutError> {
    let gate = Arc::new(PolicyGate::from_config(&config.policy));
    let fetcher = PageFetcher::new(&config.request)?;
    let pacer = Pacer::from_config(&config.policy);

    config
        .sources
        .iter()
        .map(|entry| -> Result<Arc<dyn ListingSource>, ScoutError> {
            let scraper =
                RentalIndexScraper::new(entry, gate.clone(), fetcher.clone(), pacer.clone())?;
            Ok(Arc::new(scraper))
        })
        .collect()
}
