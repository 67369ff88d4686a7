//! Store collaborator trait.
//!
//! The scan core only needs two read capabilities from a store: a segmented,
//! cursor-paginated table scan and, optionally, a listing of table names.
//! Connection setup and credentials live entirely in the implementation.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::StoreResult;
use crate::types::{Page, ScanMode};

/// Parameters for one bounded read.
#[derive(Debug)]
pub struct PageRequest<'a, C> {
    pub table: &'a str,
    pub mode: ScanMode,
    /// Resume after this cursor; `None` starts at the beginning of the segment
    pub cursor: Option<&'a C>,
    /// Maximum items evaluated by this read
    pub limit: Option<u32>,
    pub consistent_read: bool,
}

/// A table store that supports segmented, paginated scans.
///
/// # Pagination contract
///
/// A cursor returned for a `(table, mode)` pair is only ever passed back with
/// the same pair. Successive pages of one segment neither repeat nor skip
/// records, and segments of the same `total` are disjoint and together cover
/// the table. The scan core relies on this without re-verifying it.
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    /// Opaque resumption token
    type Cursor: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Issue exactly one bounded read.
    async fn scan_page(&self, request: PageRequest<'_, Self::Cursor>)
        -> StoreResult<Page<Self::Cursor>>;

    /// List available table names.
    async fn list_tables(&self) -> StoreResult<Vec<String>>;

    /// Get a human-readable name for this store.
    fn store_name(&self) -> &str;
}
