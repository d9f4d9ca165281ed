//! Statistics over stored listings and run history
//!
//! This module provides functionality for extracting and displaying
//! scrape statistics from the storage layer.

use crate::storage::{ListingStore, StoredRunSummary};
use crate::ScoutError;

/// Number of recent runs shown by default
pub const DEFAULT_RECENT_RUNS: u32 = 10;

/// Scrape statistics summary
#[derive(Debug, Clone)]
pub struct ScrapeStatistics {
    /// Total number of stored listing rows
    pub total_listings: u64,

    /// Listing rows per source, largest first
    pub listings_by_source: Vec<(String, u64)>,

    /// Most recent run summaries, newest first
    pub recent_runs: Vec<StoredRunSummary>,
}

impl ScrapeStatistics {
    /// Share of the recent runs that completed successfully (percent)
    pub fn success_rate(&self) -> f64 {
        if self.recent_runs.is_empty() {
            return 0.0;
        }
        let succeeded = self
            .recent_runs
            .iter()
            .filter(|run| run.summary.success)
            .count();
        (succeeded as f64 / self.recent_runs.len() as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
/// * `recent` - How many recent run summaries to include
///
/// # Returns
///
/// * `Ok(ScrapeStatistics)` - Successfully loaded statistics
/// * `Err(ScoutError)` - Failed to query statistics
pub fn load_statistics(store: &dyn ListingStore, recent: u32) -> Result<ScrapeStatistics, ScoutError> {
    let total_listings = store.count_listings()?;

    let mut listings_by_source = store.count_listings_by_source()?;
    listings_by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let recent_runs = store.recent_run_summaries(recent)?;

    Ok(ScrapeStatistics {
        total_listings,
        listings_by_source,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Total listings stored: {}", stats.total_listings);
    println!();

    println!("Listings by Source:");
    for (source, count) in &stats.listings_by_source {
        let percentage = if stats.total_listings > 0 {
            (*count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", source, count, percentage);
    }
    println!();

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs ({}):", stats.recent_runs.len());
        for run in &stats.recent_runs {
            let summary = &run.summary;
            let status = if summary.success { "ok" } else { "FAILED" };
            let duration = summary
                .duration_seconds()
                .map(|secs| format!("{}s", secs))
                .unwrap_or_else(|| "-".to_string());

            println!(
                "  #{} {} {} [{}] found {}, added {} ({})",
                run.id,
                summary.start_time.format("%Y-%m-%d %H:%M:%S"),
                summary.source,
                status,
                summary.listings_found,
                summary.listings_added,
                duration
            );
            if let Some(message) = &summary.error_message {
                println!("      error: {}", message);
            }
        }
        println!();

        println!(
            "Success Rate: {:.1}% of the last {} runs",
            stats.success_rate(),
            stats.recent_runs.len()
        );
    }
}
