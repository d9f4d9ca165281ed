//! Crawler module for scraping listing index pages
//!
//! This module contains the scraping pipeline, including:
//! - HTTP fetching and request pacing
//! - Listing card extraction
//! - Source runs and their persisted summaries
//! - The recurring run scheduler

mod extractor;
mod fetcher;
mod pacing;
mod run;
mod scheduler;
mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use extractor::{
    parse_details, parse_price, ListingExtractor, LocationContext, UnitDetails, DEFAULT_TITLE,
};
pub use fetcher::{build_http_client, PageFetcher};
pub use pacing::Pacer;
pub use run::{run_source, SourceRun};
pub use scheduler::{FiringReport, RunScheduler, SchedulerHandle, SourceOutcome};
pub use source::{sources_from_config, ListingSource, RentalIndexScraper};

use crate::config::Config;
use crate::storage::SqliteStoreFactory;
use crate::ScoutError;
use std::sync::Arc;

/// Builds a scheduler for every configured source, backed by SQLite
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(RunScheduler)` - Ready to `fire()` once or `start()` in the background
/// * `Err(ScoutError)` - A source or the HTTP client could not be built
pub fn build_scheduler(config: &Config) -> Result<RunScheduler, ScoutError> {
    let sources = sources_from_config(config)?;
    let stores = Arc::new(SqliteStoreFactory::new(&config.storage.database_path));
    Ok(RunScheduler::from_config(config, sources, stores))
}

/// Runs every configured source once
///
/// This is the one-shot entry point. It will:
/// 1. Build one scraper per configured source
/// 2. Run each source sequentially against the configured database
/// 3. Return the per-source outcomes
pub async fn scrape_once(config: &Config) -> Result<FiringReport, ScoutError> {
    let scheduler = build_scheduler(config)?;
    Ok(scheduler.fire().await)
}
