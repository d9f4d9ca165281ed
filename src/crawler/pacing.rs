//! Cooperative request pacing
//!
//! A source waits the crawl delay before every index fetch and a short
//! random jitter between discovered items.

use crate::config::PolicyConfig;
use rand::Rng;
use std::time::Duration;

/// Delay settings for one pacing stream
#[derive(Debug, Clone)]
pub struct Pacer {
    crawl_delay: Duration,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
}

impl Pacer {
    pub fn new(crawl_delay: Duration, jitter_min_ms: u64, jitter_max_ms: u64) -> Self {
        Self {
            crawl_delay,
            jitter_min_ms: jitter_min_ms.min(jitter_max_ms),
            jitter_max_ms,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.crawl_delay),
            config.jitter_min_ms,
            config.jitter_max_ms,
        )
    }

    /// A pacer that never waits
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, 0, 0)
    }

    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }

    /// Waits the full crawl delay
    pub async fn before_fetch(&self) {
        if !self.crawl_delay.is_zero() {
            tokio::time::sleep(self.crawl_delay).await;
        }
    }

    /// Waits a random jitter from the configured range
    pub async fn between_items(&self) {
        let jitter = self.next_jitter();
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }
    }

    /// Draws one jitter value; uniform over `[jitter_min_ms, jitter_max_ms]`
    pub fn next_jitter(&self) -> Duration {
        if self.jitter_max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.jitter_min_ms..=self.jitter_max_ms);
        Duration::from_millis(ms)
    }
}
