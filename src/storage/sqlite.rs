//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the `ListingStore`
//! trait and a factory that opens one connection per source run.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult, StoreFactory};
use crate::storage::{ListingRecord, RunSummary, StoredListing, StoredRunSummary};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const LISTING_COLUMNS: &str = "id, title, url, price, bedrooms, bathrooms, square_footage, \
     address, city, state, image_url, source, is_available, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, source, start_time, end_time, listings_found, \
     listings_added, listings_updated, success, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ListingStore for SqliteStorage {
    // ===== Listings =====

    fn create_listing(&mut self, listing: &ListingRecord) -> StorageResult<i64> {
        self.conn
            .execute(
                "INSERT INTO listings (title, url, price, bedrooms, bathrooms, square_footage,
                 address, city, state, image_url, source, is_available, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    listing.title,
                    listing.url,
                    listing.price,
                    listing.bedrooms,
                    listing.bathrooms,
                    listing.square_footage,
                    listing.address,
                    listing.city,
                    listing.state,
                    listing.image_url,
                    listing.source,
                    listing.is_available,
                    listing.created_at.to_rfc3339(),
                    listing.updated_at.to_rfc3339(),
                ],
            )
            .map_err(classify_write_error)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_listing(&mut self, id: i64, listing: &ListingRecord) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE listings SET title = ?1, url = ?2, price = ?3, bedrooms = ?4,
                 bathrooms = ?5, square_footage = ?6, address = ?7, city = ?8, state = ?9,
                 image_url = ?10, source = ?11, is_available = ?12, updated_at = ?13
                 WHERE id = ?14",
                params![
                    listing.title,
                    listing.url,
                    listing.price,
                    listing.bedrooms,
                    listing.bathrooms,
                    listing.square_footage,
                    listing.address,
                    listing.city,
                    listing.state,
                    listing.image_url,
                    listing.source,
                    listing.is_available,
                    now,
                    id
                ],
            )
            .map_err(classify_write_error)?;
        Ok(changed > 0)
    }

    fn find_listing_by_url(&self, url: &str) -> StorageResult<Option<StoredListing>> {
        let listing = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM listings WHERE url = ?1 ORDER BY id DESC LIMIT 1",
                    LISTING_COLUMNS
                ),
                params![url],
                stored_listing_from_row,
            )
            .optional()?;
        Ok(listing)
    }

    fn count_listings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_listings_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) FROM listings GROUP BY source ORDER BY source",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    // ===== Run Summaries =====

    fn create_run_summary(&mut self, summary: &RunSummary) -> StorageResult<i64> {
        self.conn
            .execute(
                "INSERT INTO run_summaries (source, start_time, end_time, listings_found,
                 listings_added, listings_updated, success, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    summary.source,
                    summary.start_time.to_rfc3339(),
                    summary.end_time.map(|t| t.to_rfc3339()),
                    summary.listings_found,
                    summary.listings_added,
                    summary.listings_updated,
                    summary.success,
                    summary.error_message,
                ],
            )
            .map_err(classify_write_error)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_run_summaries(&self, limit: u32) -> StorageResult<Vec<StoredRunSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM run_summaries ORDER BY id DESC LIMIT ?1",
            SUMMARY_COLUMNS
        ))?;

        let summaries = stmt
            .query_map(params![limit], |row| {
                Ok(StoredRunSummary {
                    id: row.get(0)?,
                    summary: RunSummary {
                        source: row.get(1)?,
                        start_time: timestamp_column(row, 2)?,
                        end_time: optional_timestamp_column(row, 3)?,
                        listings_found: row.get(4)?,
                        listings_added: row.get(5)?,
                        listings_updated: row.get(6)?,
                        success: row.get(7)?,
                        error_message: row.get(8)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }
}

/// Opens a new `SqliteStorage` connection for every run
#[derive(Debug, Clone)]
pub struct SqliteStoreFactory {
    path: PathBuf,
}

impl SqliteStoreFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StoreFactory for SqliteStoreFactory {
    fn open(&self) -> StorageResult<Box<dyn ListingStore>> {
        Ok(Box::new(SqliteStorage::new(&self.path)?))
    }
}

fn stored_listing_from_row(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    Ok(StoredListing {
        id: row.get(0)?,
        listing: ListingRecord {
            title: row.get(1)?,
            url: row.get(2)?,
            price: row.get(3)?,
            bedrooms: row.get(4)?,
            bathrooms: row.get(5)?,
            square_footage: row.get(6)?,
            address: row.get(7)?,
            city: row.get(8)?,
            state: row.get(9)?,
            image_url: row.get(10)?,
            source: row.get(11)?,
            is_available: row.get(12)?,
            created_at: timestamp_column(row, 13)?,
            updated_at: timestamp_column(row, 14)?,
        },
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw, idx)
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| parse_timestamp(&value, idx)).transpose()
}

fn parse_timestamp(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Separates constraint violations from other SQLite failures
fn classify_write_error(error: rusqlite::Error) -> StorageError {
    match &error {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(
                message.clone().unwrap_or_else(|| code.to_string()),
            )
        }
        _ => StorageError::Sqlite(error),
    }
}
