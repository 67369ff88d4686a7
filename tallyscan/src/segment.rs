//! Per-segment pagination loop

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::fetcher::PageFetcher;
use crate::metrics;
use crate::store::TableStore;
use crate::types::{ScanMode, SegmentResult};

/// How a segment's loop ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentStatus {
    /// Pagination reached the end of the segment
    Completed,
    /// A store or pagination error stopped the segment
    Failed { reason: String },
    /// The segment or scan deadline passed
    TimedOut,
    /// The scan was cancelled
    Cancelled,
}

impl SegmentStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, SegmentStatus::Completed)
    }

    /// Label for metrics and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Completed => "completed",
            SegmentStatus::Failed { .. } => "failed",
            SegmentStatus::TimedOut => "timed_out",
            SegmentStatus::Cancelled => "cancelled",
        }
    }

    fn from_error(err: &ScanError) -> Self {
        match err {
            ScanError::Timeout(_) => SegmentStatus::TimedOut,
            ScanError::Cancelled => SegmentStatus::Cancelled,
            other => SegmentStatus::Failed {
                reason: other.to_string(),
            },
        }
    }
}

/// Outcome of one segment: its (possibly partial) result plus timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentReport {
    pub mode: ScanMode,
    pub result: SegmentResult,
    pub pages: u64,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub status: SegmentStatus,
}

impl SegmentReport {
    /// Report for a segment whose worker never produced a result
    pub fn failed(mode: ScanMode, reason: impl Into<String>) -> Self {
        Self {
            mode,
            result: SegmentResult::default(),
            pages: 0,
            elapsed_ms: 0,
            status: SegmentStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Cursors remembered per segment when checking for pagination cycles
const RECENT_CURSORS: usize = 32;

/// Drives a [`PageFetcher`] over one segment until its cursor is exhausted
pub struct SegmentScanner<S: TableStore> {
    fetcher: PageFetcher<S>,
    key_attribute: String,
    segment_timeout: Option<Duration>,
}

impl<S: TableStore> SegmentScanner<S> {
    pub fn new(fetcher: PageFetcher<S>, config: &ScanConfig) -> Self {
        Self {
            fetcher,
            key_attribute: config.key_attribute.clone(),
            segment_timeout: config.segment_timeout(),
        }
    }

    /// Scan every page of `mode`.
    ///
    /// Always returns a report: on failure the result holds whatever was
    /// counted before the loop stopped.
    pub async fn scan_segment(
        &self,
        table: &str,
        mode: ScanMode,
        cancel: &CancellationToken,
    ) -> SegmentReport {
        let start = Instant::now();
        let deadline = self
            .segment_timeout
            .map(|limit| tokio::time::Instant::now() + limit);

        let mut result = SegmentResult::default();
        let mut cursor: Option<S::Cursor> = None;
        let mut recent: VecDeque<S::Cursor> = VecDeque::with_capacity(RECENT_CURSORS);
        let mut pages = 0u64;
        let mut first_skip_logged = false;

        let outcome: Result<(), ScanError> = loop {
            let fetch = self.fetcher.fetch(table, mode, cursor.as_ref(), cancel);
            let fetched = match deadline {
                Some(at) => match tokio::time::timeout_at(at, fetch).await {
                    Ok(res) => res,
                    Err(_) => Err(ScanError::Timeout(format!(
                        "{} of {} exceeded {:?}",
                        mode,
                        table,
                        self.segment_timeout.unwrap_or_default()
                    ))),
                },
                None => fetch.await,
            };

            let page = match fetched {
                Ok(page) => page,
                Err(err) => break Err(err),
            };
            pages += 1;

            for record in &page.records {
                match record.partition_key(&self.key_attribute) {
                    Ok(key) => result.record_key(key),
                    Err(err) => {
                        if !first_skip_logged {
                            warn!("Skipping record in {} of {}: {}", mode, table, err);
                            first_skip_logged = true;
                        } else {
                            debug!("Skipping record in {} of {}: {}", mode, table, err);
                        }
                        result.record_skip(&err);
                    }
                }
            }
            result.item_count += page.count;

            match page.next_cursor {
                None => break Ok(()),
                Some(next) => {
                    // A cursor seen within the window means the store is looping
                    if recent.contains(&next) {
                        break Err(ScanError::StalledCursor {
                            segment: mode.to_string(),
                        });
                    }
                    if recent.len() == RECENT_CURSORS {
                        recent.pop_front();
                    }
                    recent.push_back(next.clone());
                    cursor = Some(next);
                }
            }
        };

        let elapsed = start.elapsed();
        let status = match &outcome {
            Ok(()) => SegmentStatus::Completed,
            Err(err) => SegmentStatus::from_error(err),
        };

        match &outcome {
            Ok(()) => info!(
                "Scanned {} of {}: {} items in {:?} ({} pages)",
                mode, table, result.item_count, elapsed, pages
            ),
            Err(err) => warn!(
                "Stopped {} of {} after {} items in {:?}: {}",
                mode, table, result.item_count, elapsed, err
            ),
        }
        metrics::record_segment(status.as_str(), result.item_count, result.unparsed, elapsed);

        SegmentReport {
            mode,
            result,
            pages,
            elapsed_ms: elapsed.as_millis() as u64,
            status,
        }
    }
}
