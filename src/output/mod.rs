//! Output module for scrape reports and statistics
//!
//! This module handles:
//! - Summarizing stored listings and run history
//! - Formatting firing reports and dry-run plans

mod report;
pub mod stats;

pub use report::{format_dry_run, format_firing_report};
pub use stats::{load_statistics, print_statistics, ScrapeStatistics, DEFAULT_RECENT_RUNS};
