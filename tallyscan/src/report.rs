//! Scan outcome reporting

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::aggregator::GlobalTally;
use crate::segment::SegmentReport;
use crate::types::SegmentPlan;

/// Overall status of a coordinated scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Every segment reached the end of its pagination
    Complete,
    /// Some segments stopped early; totals are an undercount
    Partial,
    /// No segment completed
    Failed,
}

impl ScanStatus {
    /// Derive the scan status from per-segment outcomes
    pub fn from_segments(segments: &[SegmentReport]) -> Self {
        let completed = segments.iter().filter(|s| s.status.is_completed()).count();
        if completed == segments.len() && !segments.is_empty() {
            ScanStatus::Complete
        } else if completed == 0 {
            ScanStatus::Failed
        } else {
            ScanStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Complete => "complete",
            ScanStatus::Partial => "partial",
            ScanStatus::Failed => "failed",
        }
    }
}

/// Final result of [`ScanCoordinator::run_parallel_scan`](crate::ScanCoordinator::run_parallel_scan)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub table_name: String,
    pub plan: SegmentPlan,
    pub status: ScanStatus,
    /// Sum of item counts across all segments
    pub total_items: u64,
    /// Records skipped because their key could not be extracted
    pub unparsed_records: u64,
    pub tally: GlobalTally,
    /// Per-segment outcomes, ordered by segment index
    pub segments: Vec<SegmentReport>,
    pub elapsed_ms: u64,
    /// The scan-wide deadline fired
    pub timed_out: bool,
    /// The caller cancelled the scan
    pub cancelled: bool,
}

impl ScanReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Complete
    }

    /// Items per second over the whole scan
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total_items as f64 / secs
        } else {
            0.0
        }
    }

    /// Segments that did not complete
    pub fn incomplete_segments(&self) -> impl Iterator<Item = &SegmentReport> {
        self.segments.iter().filter(|s| !s.status.is_completed())
    }

    /// Sum of tally values; equals `total_items - unparsed_records` when the
    /// store's counts match the records it returned
    pub fn tallied(&self) -> u64 {
        self.tally.values().sum()
    }
}

/// Unsegmented vs parallel timing of the same table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanComparison {
    pub unsegmented: ScanReport,
    pub parallel: ScanReport,
}

impl ScanComparison {
    /// How many times faster the parallel scan ran
    pub fn speedup(&self) -> f64 {
        let parallel = self.parallel.elapsed().as_secs_f64();
        if parallel > 0.0 {
            self.unsegmented.elapsed().as_secs_f64() / parallel
        } else {
            0.0
        }
    }

    /// Whether both scans saw the same number of items.
    ///
    /// Concurrent writers or eventual consistency can make these differ.
    pub fn counts_match(&self) -> bool {
        self.unsegmented.total_items == self.parallel.total_items
    }
}
