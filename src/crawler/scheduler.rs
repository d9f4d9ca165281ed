//! Recurring scrape scheduler
//!
//! The scheduler fires immediately on start and then once per interval.
//! A firing runs every source sequentially, each in its own task so that an
//! error or panic in one source cannot take down the firing or the loop.
//! Firings never overlap: the next tick is not awaited until the current
//! firing has returned.

use crate::config::Config;
use crate::crawler::{run_source, ListingSource};
use crate::storage::{RunSummary, StoreFactory};
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Result of one source within a firing
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    /// The persisted summary, or the error text if the run escaped
    pub result: Result<RunSummary, String>,
}

impl SourceOutcome {
    /// True when the run completed and its summary was persisted
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(summary) if summary.success)
    }
}

/// Per-source outcomes of one firing, in run order
#[derive(Debug, Clone)]
pub struct FiringReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
}

impl FiringReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Triggers source runs on a fixed interval
pub struct RunScheduler {
    sources: Vec<Arc<dyn ListingSource>>,
    stores: Arc<dyn StoreFactory>,
    interval: Duration,
}

impl RunScheduler {
    /// Creates a scheduler; intervals below one second are raised to one second
    pub fn new(
        sources: Vec<Arc<dyn ListingSource>>,
        stores: Arc<dyn StoreFactory>,
        interval: Duration,
    ) -> Self {
        Self {
            sources,
            stores,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Creates a scheduler firing every `scheduler.interval-hours`
    pub fn from_config(
        config: &Config,
        sources: Vec<Arc<dyn ListingSource>>,
        stores: Arc<dyn StoreFactory>,
    ) -> Self {
        let hours = config.scheduler.interval_hours;
        Self::new(
            sources,
            stores,
            Duration::from_secs(hours.saturating_mul(3600)),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs every source once, sequentially
    pub async fn fire(&self) -> FiringReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.source_name().to_string();
            let task_source = Arc::clone(source);
            let stores = Arc::clone(&self.stores);

            let handle = tokio::spawn(async move {
                run_source(task_source.as_ref(), stores.as_ref()).await
            });

            let result = match handle.await {
                Ok(Ok(summary)) => Ok(summary),
                Ok(Err(e)) => {
                    tracing::error!("Run for {} failed: {}", name, e);
                    Err(e.to_string())
                }
                Err(e) => {
                    let error = aborted(&name, e);
                    tracing::error!("{}", error);
                    Err(error.to_string())
                }
            };

            outcomes.push(SourceOutcome {
                source: name,
                result,
            });
        }

        FiringReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    /// Fires now and then every interval until `token` is cancelled
    ///
    /// Returns the number of firings performed. Cancellation never
    /// interrupts a firing in progress.
    pub async fn run_until_cancelled(&self, token: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut firings = 0u64;

        tracing::info!(
            "Scheduler started: {} sources every {:?}",
            self.sources.len(),
            self.interval
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            firings += 1;
            tracing::info!("Starting firing {}", firings);
            let report = self.fire().await;
            tracing::info!(
                "Firing {} finished: {} succeeded, {} failed",
                firings,
                report.succeeded(),
                report.failed()
            );
        }

        tracing::info!("Scheduler stopped after {} firings", firings);
        firings
    }

    /// Moves the scheduler onto a background task
    pub fn start(self) -> SchedulerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move { self.run_until_cancelled(loop_token).await });

        SchedulerHandle { token, task }
    }
}

fn aborted(source_name: &str, error: JoinError) -> ScoutError {
    let message = if error.is_panic() {
        "source task panicked".to_string()
    } else {
        error.to_string()
    };
    ScoutError::TaskAborted {
        source_name: source_name.to_string(),
        message,
    }
}

/// Control handle for a started scheduler
pub struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Prevents future firings; a firing in progress runs to completion
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Waits for the loop to exit and returns how many firings it performed
    pub async fn join(self) -> Result<u64, JoinError> {
        self.task.await
    }
}
