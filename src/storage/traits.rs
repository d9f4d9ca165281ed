//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ListingRecord, RunSummary, StoredListing, StoredRunSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Write and read operations the scraper needs from its backing store
///
/// One store value corresponds to one open connection; dropping it releases
/// the connection.
pub trait ListingStore: Send {
    // ===== Listings =====

    /// Inserts a listing and returns its id
    ///
    /// Fails with `StorageError::ConstraintViolation` when the record breaks
    /// a schema constraint (e.g. a negative price).
    fn create_listing(&mut self, listing: &ListingRecord) -> StorageResult<i64>;

    /// Overwrites an existing listing, refreshing its `updated_at`
    ///
    /// Returns false when no listing has the given id. Source runs do not
    /// call this; it is the hook for a future update-by-URL path.
    fn update_listing(&mut self, id: i64, listing: &ListingRecord) -> StorageResult<bool>;

    /// Finds the most recently inserted listing with the given URL
    fn find_listing_by_url(&self, url: &str) -> StorageResult<Option<StoredListing>>;

    /// Counts all stored listings
    fn count_listings(&self) -> StorageResult<u64>;

    /// Counts stored listings grouped by source name
    fn count_listings_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Run Summaries =====

    /// Inserts a finalized run summary and returns its id
    fn create_run_summary(&mut self, summary: &RunSummary) -> StorageResult<i64>;

    /// Gets the most recent run summaries, newest first
    fn recent_run_summaries(&self, limit: u32) -> StorageResult<Vec<StoredRunSummary>>;
}

/// Opens a fresh store for each source run
pub trait StoreFactory: Send + Sync {
    fn open(&self) -> StorageResult<Box<dyn ListingStore>>;
}
