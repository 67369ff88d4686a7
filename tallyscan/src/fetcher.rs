//! Single-page reads with retry and cancellation

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{RetryConfig, ScanConfig};
use crate::error::{Result, ScanError};
use crate::metrics;
use crate::store::{PageRequest, TableStore};
use crate::types::{Page, ScanMode};

/// Issues bounded reads against a store.
///
/// Retryable errors are retried on the same cursor with exponential backoff;
/// anything else is returned to the caller. Every read and every backoff sleep
/// is raced against the cancellation token.
pub struct PageFetcher<S: TableStore> {
    store: Arc<S>,
    retry: RetryConfig,
    page_limit: Option<u32>,
    consistent_read: bool,
}

impl<S: TableStore> Clone for PageFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retry: self.retry.clone(),
            page_limit: self.page_limit,
            consistent_read: self.consistent_read,
        }
    }
}

impl<S: TableStore> PageFetcher<S> {
    pub fn new(store: Arc<S>, config: &ScanConfig) -> Self {
        Self {
            store,
            retry: config.retry.clone(),
            page_limit: config.page_limit,
            consistent_read: config.consistent_read,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch one page of `mode`, resuming after `cursor`
    pub async fn fetch(
        &self,
        table: &str,
        mode: ScanMode,
        cursor: Option<&S::Cursor>,
        cancel: &CancellationToken,
    ) -> Result<Page<S::Cursor>> {
        let store_name = self.store.store_name();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let request = PageRequest {
                table,
                mode,
                cursor,
                limit: self.page_limit,
                consistent_read: self.consistent_read,
            };

            let start = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                res = self.store.scan_page(request) => res,
            };
            let elapsed = start.elapsed();
            metrics::record_page_fetch(store_name, elapsed, outcome.is_ok());

            let err = match outcome {
                Ok(page) => {
                    debug!(
                        "Fetched {} items from {} of {} in {:?} (more={})",
                        page.count,
                        mode,
                        table,
                        elapsed,
                        page.next_cursor.is_some()
                    );
                    return Ok(page);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                warn!("Read of {} on {} failed: {}", mode, table, err);
                return Err(err.into());
            }
            if attempt >= self.retry.max_attempts {
                warn!(
                    "Read of {} on {} failed after {} attempts: {}",
                    mode, table, attempt, err
                );
                return Err(ScanError::RetriesExhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                "Retrying read of {} on {} in {:?} (attempt {}/{}): {}",
                mode, table, delay, attempt, self.retry.max_attempts, err
            );
            metrics::record_retry(store_name, err.error_type());

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
