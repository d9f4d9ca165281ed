//! One run of one source
//!
//! `SourceRun` tracks the lifecycle `Idle -> Running -> {Completed, Failed}`
//! and the `RunSummary` that goes with it. `run_source` drives a complete
//! run: scrape, persist every record, then persist the summary exactly once.

use crate::crawler::ListingSource;
use crate::state::RunState;
use crate::storage::{ListingRecord, ListingStore, RunSummary, StoreFactory};
use crate::ScoutError;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Lifecycle and counters of a single source run
#[derive(Debug, Clone)]
pub struct SourceRun {
    state: RunState,
    summary: RunSummary,
}

impl SourceRun {
    /// Creates an idle run for the named source
    pub fn new(source: &str) -> Self {
        Self {
            state: RunState::Idle,
            summary: RunSummary::begin(source, Utc::now()),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Idle -> Running; resets the summary with the current start time
    pub fn start(&mut self) -> Result<(), ScoutError> {
        self.transition(RunState::Running)?;
        self.summary = RunSummary::begin(&self.summary.source, Utc::now());
        Ok(())
    }

    pub fn record_found(&mut self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.summary.listings_found = self.summary.listings_found.saturating_add(count);
    }

    pub fn record_added(&mut self) {
        self.summary.listings_added = self.summary.listings_added.saturating_add(1);
    }

    /// Running -> Completed
    pub fn complete(&mut self) -> Result<(), ScoutError> {
        self.transition(RunState::Completed)?;
        self.summary.end_time = Some(Utc::now());
        self.summary.success = true;
        Ok(())
    }

    /// Running -> Failed, keeping `message` as the summary's error text
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), ScoutError> {
        self.transition(RunState::Failed)?;
        self.summary.end_time = Some(Utc::now());
        self.summary.success = false;
        self.summary.error_message = Some(message.into());
        Ok(())
    }

    /// Consumes a finished run and yields its summary
    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    fn transition(&mut self, to: RunState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(to) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(
            "Run for {}: {} -> {}",
            self.summary.source,
            self.state,
            to
        );
        self.state = to;
        Ok(())
    }
}

/// Runs one source end to end and persists its summary
///
/// # Arguments
///
/// * `source` - The source to scrape
/// * `stores` - Opens the connection used for the whole run
///
/// # Returns
///
/// * `Ok(RunSummary)` - The persisted summary; `success` tells whether the
///   run completed or failed
/// * `Err(ScoutError)` - The summary itself could not be persisted
pub async fn run_source(
    source: &dyn ListingSource,
    stores: &dyn StoreFactory,
) -> Result<RunSummary, ScoutError> {
    let mut run = SourceRun::new(source.source_name());
    run.start()?;
    tracing::info!("Starting scrape for {}", source.source_name());

    let mut store = match stores.open() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot open store for {}: {}", source.source_name(), e);
            run.fail(e.to_string())?;
            let mut store = stores.open()?;
            return persist_summary(store.as_mut(), run);
        }
    };

    let outcome = AssertUnwindSafe(scrape_and_persist(source, store.as_mut(), &mut run))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => run.complete()?,
        Ok(Err(e)) => {
            tracing::error!("Error in scraper for {}: {}", source.source_name(), e);
            run.fail(e.to_string())?;
        }
        Err(payload) => {
            let message = format!("source panicked: {}", panic_message(payload.as_ref()));
            tracing::error!("Error in scraper for {}: {}", source.source_name(), message);
            run.fail(message)?;
        }
    }

    persist_summary(store.as_mut(), run)
}

async fn scrape_and_persist(
    source: &dyn ListingSource,
    store: &mut dyn ListingStore,
    run: &mut SourceRun,
) -> Result<(), ScoutError> {
    let listings = source.scrape().await?;
    run.record_found(listings.len());
    persist_listings(store, &listings, run);
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Inserts every record; a failed insert is logged and not counted
fn persist_listings(store: &mut dyn ListingStore, listings: &[ListingRecord], run: &mut SourceRun) {
    for listing in listings {
        match store.create_listing(listing) {
            Ok(id) => {
                tracing::debug!("Stored listing {} as {}", listing.url, id);
                run.record_added();
            }
            Err(e) => tracing::error!("Failed to store listing {}: {}", listing.url, e),
        }
    }
}

fn persist_summary(store: &mut dyn ListingStore, run: SourceRun) -> Result<RunSummary, ScoutError> {
    let summary = run.into_summary();
    store.create_run_summary(&summary)?;

    tracing::info!(
        "Finished {} run: {} found, {} added, success={}",
        summary.source,
        summary.listings_found,
        summary.listings_added,
        summary.success
    );

    Ok(summary)
}
