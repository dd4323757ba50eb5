//! Bounded fetch pool with a hard per-fetch deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pricenest_core::AppConfig;
use tokio::sync::Semaphore;

use crate::error::ScraperError;

/// Limits how many upstream fetches run at once and how long each may take.
///
/// Owned by the caller and cloned into tasks; clones share the same permits.
/// The deadline covers the fetch itself, not time spent waiting for a permit.
#[derive(Debug, Clone)]
pub struct FetchPool {
    permits: Arc<Semaphore>,
    workers: usize,
    timeout: Duration,
}

impl FetchPool {
    /// # Panics
    ///
    /// Panics if `workers` is zero.
    #[must_use]
    pub fn new(workers: usize, timeout_secs: u64) -> Self {
        assert!(workers > 0, "fetch pool needs at least one worker");
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Pool sized from `PRICENEST_FETCH_WORKERS` and
    /// `PRICENEST_FETCH_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.fetch_workers, config.fetch_timeout_secs)
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Runs `fetch` once a permit is free, aborting it after the deadline.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] if `fetch` does not finish in time.
    /// - [`ScraperError::PoolClosed`] if the pool was closed while waiting.
    /// - Any error returned by `fetch` itself.
    pub async fn run<T, F>(&self, label: &str, fetch: F) -> Result<T, ScraperError>
    where
        F: Future<Output = Result<T, ScraperError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScraperError::PoolClosed)?;

        if let Ok(result) = tokio::time::timeout(self.timeout, fetch).await {
            result
        } else {
            tracing::warn!(
                label,
                timeout_secs = self.timeout.as_secs(),
                "fetch timed out"
            );
            Err(ScraperError::Timeout {
                label: label.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            })
        }
    }

    /// Stops handing out permits; queued and future `run` calls fail with
    /// [`ScraperError::PoolClosed`].
    pub fn close(&self) {
        self.permits.close();
    }
}
