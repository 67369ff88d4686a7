//! Coordinated parallel scan
//!
//! ```text
//! ScanJobSpec → [Segment 0, Segment 1, ... Segment N-1] → Aggregator → ScanReport
//!                        ↓
//!          one worker per segment, all spawned up front
//!                        ↓
//!          barrier join, per-segment outcome collected
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::metrics;
use crate::report::{ScanComparison, ScanReport, ScanStatus};
use crate::segment::{SegmentReport, SegmentScanner, SegmentStatus};
use crate::store::TableStore;
use crate::types::ScanJobSpec;

/// Fans a table scan out over segments and merges the results
pub struct ScanCoordinator<S: TableStore> {
    store: Arc<S>,
    config: ScanConfig,
}

impl<S: TableStore> ScanCoordinator<S> {
    /// Create a coordinator, rejecting invalid configuration
    pub fn new(store: Arc<S>, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// List tables available in the underlying store
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.store.list_tables().await?)
    }

    /// Run `job` to completion
    pub async fn run_parallel_scan(&self, job: &ScanJobSpec) -> ScanReport {
        self.run_with_cancel(job, &CancellationToken::new()).await
    }

    /// Run `job`, stopping every in-flight segment when `cancel` fires.
    ///
    /// The returned report is only produced after every worker has finished;
    /// a fresh tally is used for each call.
    pub async fn run_with_cancel(
        &self,
        job: &ScanJobSpec,
        cancel: &CancellationToken,
    ) -> ScanReport {
        let start = Instant::now();
        let aggregator = Arc::new(Aggregator::new());
        let scan_token = cancel.child_token();
        let timed_out = Arc::new(AtomicBool::new(false));

        let deadline_task = self.config.scan_timeout().map(|limit| {
            let token = scan_token.clone();
            let flag = Arc::clone(&timed_out);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                flag.store(true, Ordering::Relaxed);
                token.cancel();
            })
        });

        let scanner = Arc::new(SegmentScanner::new(
            PageFetcher::new(Arc::clone(&self.store), &self.config),
            &self.config,
        ));

        let modes = job.modes();
        info!(
            "Starting scan of {} on {} with {} workers",
            job.table_name(),
            self.store.store_name(),
            modes.len()
        );

        let handles: Vec<_> = modes
            .into_iter()
            .map(|mode| {
                let scanner = Arc::clone(&scanner);
                let aggregator = Arc::clone(&aggregator);
                let token = scan_token.child_token();
                let table = job.table_name().to_string();

                let handle = tokio::spawn(async move {
                    info!("Worker {} starting", mode);
                    let report = scanner.scan_segment(&table, mode, &token).await;
                    aggregator.merge(&report.result);
                    info!("Worker {} done", mode);
                    report
                });
                (mode, handle)
            })
            .collect();

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(mode, handle)| async move { (mode, handle.await) }),
        )
        .await;

        if let Some(task) = deadline_task {
            task.abort();
        }
        let timed_out = timed_out.load(Ordering::Relaxed);

        let mut segments: Vec<SegmentReport> = joined
            .into_iter()
            .map(|(mode, joined)| match joined {
                Ok(report) => report,
                Err(e) => {
                    warn!("Worker {} did not finish: {}", mode, e);
                    SegmentReport::failed(mode, format!("worker did not finish: {}", e))
                }
            })
            .collect();

        // Segments stopped by the scan deadline observe it as a cancellation.
        if timed_out {
            for segment in &mut segments {
                if segment.status == SegmentStatus::Cancelled {
                    segment.status = SegmentStatus::TimedOut;
                }
            }
        }
        segments.sort_by_key(|s| s.mode.index());

        let status = ScanStatus::from_segments(&segments);
        let elapsed = start.elapsed();
        let report = ScanReport {
            table_name: job.table_name().to_string(),
            plan: job.plan(),
            status,
            total_items: aggregator.total_items(),
            unparsed_records: aggregator.unparsed(),
            tally: aggregator.snapshot(),
            segments,
            elapsed_ms: elapsed.as_millis() as u64,
            timed_out,
            cancelled: cancel.is_cancelled(),
        };

        metrics::record_scan(job.table_name(), status.as_str(), report.total_items, elapsed);

        if report.is_complete() {
            info!(
                "Scan of {} complete: {} items, {} keys in {:?} ({:.0} items/s)",
                report.table_name,
                report.total_items,
                report.tally.len(),
                elapsed,
                report.throughput()
            );
        } else {
            warn!(
                "Scan of {} is {}: {}/{} segments incomplete, {} items counted in {:?}",
                report.table_name,
                status.as_str(),
                report.incomplete_segments().count(),
                report.segments.len(),
                report.total_items,
                elapsed
            );
        }

        report
    }

    /// Scan the table once without segmentation and once in parallel
    pub async fn compare_with_unsegmented(
        &self,
        job: &ScanJobSpec,
        cancel: &CancellationToken,
    ) -> ScanComparison {
        let unsegmented = self.run_with_cancel(&job.as_unsegmented(), cancel).await;
        let parallel = self.run_with_cancel(job, cancel).await;
        let comparison = ScanComparison {
            unsegmented,
            parallel,
        };

        info!(
            "Parallel scan of {} ran {:.2}x faster than the full-table scan",
            job.table_name(),
            comparison.speedup()
        );
        if !comparison.counts_match() {
            warn!(
                "Item counts differ between scans of {} ({} vs {}); the table changed or reads were eventually consistent",
                job.table_name(),
                comparison.unsegmented.total_items,
                comparison.parallel.total_items
            );
        }

        comparison
    }
}
