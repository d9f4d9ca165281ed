//! In-memory fakes shared by the run and scheduler tests

use crate::crawler::ListingSource;
use crate::storage::{
    ListingRecord, ListingStore, RunSummary, StorageError, StorageResult, StoreFactory,
    StoredListing, StoredRunSummary,
};
use crate::ScoutError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct MemoryState {
    pub listings: Vec<ListingRecord>,
    pub summaries: Vec<RunSummary>,
    pub opens: usize,
    pub failing_opens: usize,
    pub fail_summaries: bool,
}

/// Store backed by shared vectors; rejects negative prices like the schema does
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl ListingStore for MemoryStore {
    fn create_listing(&mut self, listing: &ListingRecord) -> StorageResult<i64> {
        if listing.price < 0.0 {
            return Err(StorageError::ConstraintViolation(format!(
                "negative price for {}",
                listing.url
            )));
        }
        let mut state = self.state.lock().unwrap();
        state.listings.push(listing.clone());
        Ok(state.listings.len() as i64)
    }

    fn update_listing(&mut self, id: i64, listing: &ListingRecord) -> StorageResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.listings.get_mut((id - 1) as usize) {
            Some(existing) => {
                *existing = listing.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_listing_by_url(&self, url: &str) -> StorageResult<Option<StoredListing>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .listings
            .iter()
            .enumerate()
            .rev()
            .find(|(_, l)| l.url == url)
            .map(|(i, l)| StoredListing {
                id: i as i64 + 1,
                listing: l.clone(),
            }))
    }

    fn count_listings(&self) -> StorageResult<u64> {
        Ok(self.state.lock().unwrap().listings.len() as u64)
    }

    fn count_listings_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let state = self.state.lock().unwrap();
        let mut counts: Vec<(String, u64)> = Vec::new();
        for listing in &state.listings {
            match counts.iter_mut().find(|(s, _)| *s == listing.source) {
                Some((_, n)) => *n += 1,
                None => counts.push((listing.source.clone(), 1)),
            }
        }
        Ok(counts)
    }

    fn create_run_summary(&mut self, summary: &RunSummary) -> StorageResult<i64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_summaries {
            return Err(StorageError::Database("disk full".to_string()));
        }
        state.summaries.push(summary.clone());
        Ok(state.summaries.len() as i64)
    }

    fn recent_run_summaries(&self, limit: u32) -> StorageResult<Vec<StoredRunSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .summaries
            .iter()
            .enumerate()
            .rev()
            .take(limit as usize)
            .map(|(i, s)| StoredRunSummary {
                id: i as i64 + 1,
                summary: s.clone(),
            })
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStoreFactory {
    pub state: Arc<Mutex<MemoryState>>,
}

impl MemoryStoreFactory {
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.state.lock().unwrap().summaries.clone()
    }

    pub fn listings(&self) -> Vec<ListingRecord> {
        self.state.lock().unwrap().listings.clone()
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn open(&self) -> StorageResult<Box<dyn ListingStore>> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(StorageError::Database("unable to open database".to_string()));
        }
        Ok(Box::new(MemoryStore {
            state: Arc::clone(&self.state),
        }))
    }
}

pub enum Behavior {
    Return(Vec<ListingRecord>),
    Fail(String),
    Panic,
    Sleep(Duration),
}

/// Source with scripted behavior that counts its invocations
pub struct ScriptedSource {
    name: String,
    behavior: Behavior,
    pub calls: AtomicUsize,
    pub finished: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Result<Vec<ListingRecord>, ScoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.behavior {
            Behavior::Return(records) => Ok(records.clone()),
            Behavior::Fail(message) => Err(ScoutError::TaskAborted {
                source_name: self.name.clone(),
                message: message.clone(),
            }),
            Behavior::Panic => panic!("scripted panic in {}", self.name),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

pub fn listing(url: &str, price: f64) -> ListingRecord {
    let now = Utc::now();
    ListingRecord {
        title: "Apartment for Rent".to_string(),
        url: url.to_string(),
        price,
        bedrooms: 1,
        bathrooms: 1.0,
        square_footage: 650.0,
        address: "1 Main St".to_string(),
        city: "Miami".to_string(),
        state: "FL".to_string(),
        image_url: String::new(),
        source: "zillow.com".to_string(),
        is_available: true,
        created_at: now,
        updated_at: now,
    }
}
