//! Storage module for persisting listings and run summaries
//!
//! This module handles all database operations for the scraper, including:
//! - SQLite database initialization and schema management
//! - Listing persistence
//! - Run summary (audit) persistence
//! - Per-run connection acquisition through a `StoreFactory`

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteStorage, SqliteStoreFactory};
pub use traits::{ListingStore, StorageError, StorageResult, StoreFactory};

use chrono::{DateTime, Utc};

/// One scraped listing
///
/// Numeric fields use 0 for "unknown". Records are built by the extractor
/// and are not modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub title: String,
    /// Detail-page URL; the natural identity of a listing
    pub url: String,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: f64,
    pub address: String,
    pub city: String,
    /// Two-letter state code, or empty
    pub state: String,
    pub image_url: String,
    /// Name of the source that produced this record
    pub source: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing as stored, with its row id
#[derive(Debug, Clone)]
pub struct StoredListing {
    pub id: i64,
    pub listing: ListingRecord,
}

/// Audit record for one source run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub source: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub listings_found: u32,
    pub listings_added: u32,
    pub listings_updated: u32,
    pub success: bool,
    pub error_message: Option<String>,
}

impl RunSummary {
    /// Creates the summary of a run that starts now, with zero counts
    pub fn begin(source: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            source: source.to_string(),
            start_time,
            end_time: None,
            listings_found: 0,
            listings_added: 0,
            listings_updated: 0,
            success: false,
            error_message: None,
        }
    }

    /// Wall-clock duration of the run, once it has ended
    pub fn duration_seconds(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds())
    }
}

/// A run summary as stored, with its row id
#[derive(Debug, Clone)]
pub struct StoredRunSummary {
    pub id: i64,
    pub summary: RunSummary,
}
