//! tallyscan - parallel segmented table scans with per-key occurrence tallies
//!
//! Reads every record of a partitioned table through the store's cursor
//! pagination, spreads the work over independent segments and merges each
//! segment's key counts into one global tally.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ScanCoordinator                                          │
//! │   one worker per segment, barrier join, ScanReport       │
//! │        │               │                │                │
//! │        ▼               ▼                ▼                │
//! │  SegmentScanner  SegmentScanner  SegmentScanner          │
//! │   loop until the continuation cursor is exhausted        │
//! │        │               │                │                │
//! │        ▼               ▼                ▼                │
//! │  PageFetcher ── retry/backoff, cancellation ──┐          │
//! │        │                                      │          │
//! │        ▼                                      ▼          │
//! │  TableStore (DynamoDB, memory)          Aggregator       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tallyscan::{MemoryStore, Record, ScanConfig, ScanCoordinator, ScanJobSpec};
//!
//! # async fn example() -> tallyscan::Result<()> {
//! let store = MemoryStore::new();
//! store.insert_table(
//!     "logs",
//!     vec![Record::new().with_field("logGroup", "/aws/lambda/ingest")],
//! );
//!
//! let coordinator = ScanCoordinator::new(Arc::new(store), ScanConfig::default())?;
//! let report = coordinator
//!     .run_parallel_scan(&ScanJobSpec::new("logs", 4)?)
//!     .await;
//!
//! assert_eq!(report.total_items, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Retryable store errors are retried on the same cursor with bounded
//! exponential backoff. Fatal errors, timeouts and cancellation stop only the
//! affected segment; the report's [`ScanStatus`] says whether the totals are
//! complete, partial or failed.

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod report;
pub mod segment;
pub mod store;
pub mod types;

pub use aggregator::{Aggregator, GlobalTally};
pub use config::{RetryConfig, ScanConfig};
pub use coordinator::ScanCoordinator;
pub use error::{KeyError, Result, ScanError, StoreError, StoreResult};
pub use fetcher::PageFetcher;
pub use report::{ScanComparison, ScanReport, ScanStatus};
pub use segment::{SegmentReport, SegmentScanner, SegmentStatus};
pub use store::{MemoryCursor, MemoryStore, PageRequest, TableStore};
pub use types::{
    Page, Record, ScanJobSpec, ScanMode, SegmentPlan, SegmentResult, MAX_TOTAL_SEGMENTS,
};

// Re-exported so callers can cancel scans without a direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;
