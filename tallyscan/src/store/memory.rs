//! In-process table store.
//!
//! Records are assigned to segments round-robin by insertion position, which
//! satisfies the disjoint-and-complete segmentation contract. Faults and
//! latency can be injected to exercise retry, timeout and partial-failure
//! paths.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::traits::{PageRequest, TableStore};
use crate::error::{StoreError, StoreResult};
use crate::types::{Page, Record, ScanMode};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Position within a segment's record sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCursor {
    pub position: usize,
}

/// In-memory [`TableStore`]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    page_size: usize,
    latency: Option<Duration>,
    /// One-shot faults served to the next reads, any segment
    faults: Mutex<VecDeque<StoreError>>,
    /// Faults keyed by 1-based read number
    scheduled_faults: Mutex<HashMap<u64, StoreError>>,
    /// Persistent faults by segment index
    failing_segments: RwLock<HashMap<u32, StoreError>>,
    reads: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            faults: Mutex::new(VecDeque::new()),
            scheduled_faults: Mutex::new(HashMap::new()),
            failing_segments: RwLock::new(HashMap::new()),
            reads: AtomicU64::new(0),
        }
    }

    /// Maximum records per page when the request sets no limit
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sleep this long inside every read
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Create or replace a table
    pub fn insert_table(&self, name: impl Into<String>, records: Vec<Record>) {
        self.tables.write().insert(name.into(), records);
    }

    /// Fail the next read (whichever segment issues it) with `error`
    pub fn push_fault(&self, error: StoreError) {
        self.faults.lock().push_back(error);
    }

    /// Fail the `read`-th read served by this store (1-based)
    pub fn fail_read(&self, read: u64, error: StoreError) {
        self.scheduled_faults.lock().insert(read, error);
    }

    /// Fail every read of segment `index` with `error`
    pub fn fail_segment(&self, index: u32, error: StoreError) {
        self.failing_segments.write().insert(index, error);
    }

    /// Number of reads served so far, including failed ones
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Records belonging to `mode`, in scan order
    fn segment_records(records: &[Record], mode: ScanMode) -> Vec<&Record> {
        match mode {
            ScanMode::Unsegmented => records.iter().collect(),
            ScanMode::Segmented { index, total } => records
                .iter()
                .enumerate()
                .filter(|(pos, _)| *pos as u64 % total as u64 == index as u64)
                .map(|(_, r)| r)
                .collect(),
        }
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    type Cursor = MemoryCursor;

    async fn scan_page(
        &self,
        request: PageRequest<'_, MemoryCursor>,
    ) -> StoreResult<Page<MemoryCursor>> {
        let read = self.reads.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.faults.lock().pop_front() {
            return Err(err);
        }

        if let Some(err) = self.scheduled_faults.lock().remove(&read) {
            return Err(err);
        }

        if let Some(index) = request.mode.index() {
            if let Some(err) = self.failing_segments.read().get(&index) {
                return Err(err.clone());
            }
        }

        let tables = self.tables.read();
        let records = tables
            .get(request.table)
            .ok_or_else(|| StoreError::TableNotFound(request.table.to_string()))?;

        let segment = Self::segment_records(records, request.mode);
        let start = request.cursor.map(|c| c.position).unwrap_or(0);
        if start > segment.len() {
            return Err(StoreError::InvalidRequest(format!(
                "cursor position {} beyond segment length {}",
                start,
                segment.len()
            )));
        }

        let limit = request
            .limit
            .map(|l| l as usize)
            .unwrap_or(self.page_size)
            .max(1);
        let end = (start + limit).min(segment.len());

        let page_records: Vec<Record> = segment[start..end].iter().map(|r| (*r).clone()).collect();
        let next_cursor = (end < segment.len()).then_some(MemoryCursor { position: end });

        Ok(Page::new(page_records, next_cursor))
    }

    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new().with_field("id", i as u64))
            .collect()
    }

    fn request<'a>(
        table: &'a str,
        mode: ScanMode,
        cursor: Option<&'a MemoryCursor>,
    ) -> PageRequest<'a, MemoryCursor> {
        PageRequest {
            table,
            mode,
            cursor,
            limit: None,
            consistent_read: false,
        }
    }

    #[tokio::test]
    async fn test_pages_through_unsegmented_table() {
        let store = MemoryStore::new().with_page_size(4);
        store.insert_table("t", records(10));

        let first = store
            .scan_page(request("t", ScanMode::Unsegmented, None))
            .await
            .unwrap();
        assert_eq!(first.count, 4);
        assert_eq!(first.next_cursor, Some(MemoryCursor { position: 4 }));

        let cursor = first.next_cursor.unwrap();
        let second = store
            .scan_page(request("t", ScanMode::Unsegmented, Some(&cursor)))
            .await
            .unwrap();
        assert_eq!(second.count, 4);

        let cursor = second.next_cursor.unwrap();
        let last = store
            .scan_page(request("t", ScanMode::Unsegmented, Some(&cursor)))
            .await
            .unwrap();
        assert_eq!(last.count, 2);
        assert!(last.is_last());
        assert_eq!(store.reads(), 3);
    }

    #[tokio::test]
    async fn test_segments_are_round_robin() {
        let store = MemoryStore::new();
        store.insert_table("t", records(7));

        let mode = ScanMode::Segmented { index: 1, total: 3 };
        let page = store.scan_page(request("t", mode, None)).await.unwrap();
        let ids: Vec<u64> = page
            .records
            .iter()
            .map(|r| r.get("id").unwrap().as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_empty_table_yields_single_empty_page() {
        let store = MemoryStore::new();
        store.insert_table("t", Vec::new());

        let page = store
            .scan_page(request("t", ScanMode::Unsegmented, None))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new();
        let err = store
            .scan_page(request("nope", ScanMode::Unsegmented, None))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::TableNotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_faults_are_served_once_and_segment_faults_persist() {
        let store = MemoryStore::new();
        store.insert_table("t", records(3));
        store.push_fault(StoreError::Throttled("busy".into()));
        store.fail_segment(1, StoreError::PermissionDenied("denied".into()));

        let mode = ScanMode::Segmented { index: 0, total: 2 };
        assert!(store.scan_page(request("t", mode, None)).await.is_err());
        assert!(store.scan_page(request("t", mode, None)).await.is_ok());

        let failing = ScanMode::Segmented { index: 1, total: 2 };
        for _ in 0..2 {
            let err = store.scan_page(request("t", failing, None)).await.unwrap_err();
            assert!(!err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_scheduled_fault_hits_exact_read() {
        let store = MemoryStore::new().with_page_size(1);
        store.insert_table("t", records(3));
        store.fail_read(2, StoreError::Backend("boom".into()));

        let first = store
            .scan_page(request("t", ScanMode::Unsegmented, None))
            .await
            .unwrap();
        let cursor = first.next_cursor.unwrap();
        assert!(store
            .scan_page(request("t", ScanMode::Unsegmented, Some(&cursor)))
            .await
            .is_err());
        assert!(store
            .scan_page(request("t", ScanMode::Unsegmented, Some(&cursor)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let store = MemoryStore::new();
        store.insert_table("zeta", Vec::new());
        store.insert_table("alpha", Vec::new());
        assert_eq!(store.list_tables().await.unwrap(), vec!["alpha", "zeta"]);
    }
}
