//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tallyscan::{
    MemoryStore, Page, PageRequest, Record, ScanMode, StoreError, StoreResult, TableStore,
};

/// Store that replays a fixed page sequence for a single segment.
///
/// The cursor is the index of the next page to serve.
pub struct ScriptedStore {
    pages: Vec<Page<u32>>,
    faults: Mutex<VecDeque<StoreError>>,
    seen_cursors: Mutex<Vec<Option<u32>>>,
}

impl ScriptedStore {
    pub fn new(pages: Vec<Page<u32>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            faults: Mutex::new(VecDeque::new()),
            seen_cursors: Mutex::new(Vec::new()),
        })
    }

    pub fn push_fault(&self, error: StoreError) {
        self.faults.lock().push_back(error);
    }

    /// Cursors received, in call order
    pub fn seen_cursors(&self) -> Vec<Option<u32>> {
        self.seen_cursors.lock().clone()
    }
}

#[async_trait]
impl TableStore for ScriptedStore {
    type Cursor = u32;

    async fn scan_page(&self, request: PageRequest<'_, u32>) -> StoreResult<Page<u32>> {
        self.seen_cursors.lock().push(request.cursor.copied());

        if let Some(err) = self.faults.lock().pop_front() {
            return Err(err);
        }

        let index = request.cursor.copied().unwrap_or(0) as usize;
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| StoreError::InvalidRequest(format!("no page {}", index)))
    }

    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }

    fn store_name(&self) -> &str {
        "scripted"
    }
}

/// Page of records keyed by `logGroup`, linking to page `next`
pub fn page(keys: &[&str], next: Option<u32>) -> Page<u32> {
    Page::new(keyed(keys), next)
}

/// Page with no records but a continuation cursor
pub fn empty_page(next: Option<u32>) -> Page<u32> {
    Page::new(Vec::new(), next)
}

pub fn keyed(keys: &[&str]) -> Vec<Record> {
    keys.iter()
        .map(|k| Record::new().with_field("logGroup", *k))
        .collect()
}

/// Memory store holding `table` with `n` records spread over `keys` distinct keys
pub fn memory_table(table: &str, n: usize, keys: usize, page_size: usize) -> Arc<MemoryStore> {
    let store = MemoryStore::new().with_page_size(page_size);
    store.insert_table(
        table,
        (0..n)
            .map(|i| {
                Record::new()
                    .with_field("id", i as u64)
                    .with_field("logGroup", format!("/aws/lambda/fn-{}", i % keys.max(1)))
            })
            .collect(),
    );
    Arc::new(store)
}

pub fn segment(index: u32, total: u32) -> ScanMode {
    ScanMode::Segmented { index, total }
}
