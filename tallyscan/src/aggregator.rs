//! Shared tally merged from concurrent segment workers

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::SegmentResult;

/// Final key → occurrence count mapping, ordered by key
pub type GlobalTally = BTreeMap<String, u64>;

/// Concurrency-safe accumulator for one coordinated scan.
///
/// Every increment of the shared map happens under one mutex, so concurrent
/// merges of the same key never lose updates. Counters are plain atomics.
/// Entries are only ever inserted or incremented.
#[derive(Debug, Default)]
pub struct Aggregator {
    tally: Mutex<HashMap<String, u64>>,
    total_items: AtomicU64,
    unparsed: AtomicU64,
    merged_segments: AtomicU64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one segment's result into the shared state
    pub fn merge(&self, from: &SegmentResult) {
        {
            let mut tally = self.tally.lock();
            for (key, count) in &from.tally {
                *tally.entry(key.clone()).or_insert(0) += count;
            }
        }
        self.total_items.fetch_add(from.item_count, Ordering::Relaxed);
        self.unparsed.fetch_add(from.unparsed, Ordering::Relaxed);
        self.merged_segments.fetch_add(1, Ordering::Relaxed);
    }

    /// Add `by` to a single key
    pub fn increment(&self, key: &str, by: u64) {
        let mut tally = self.tally.lock();
        match tally.get_mut(key) {
            Some(count) => *count += by,
            None => {
                tally.insert(key.to_string(), by);
            }
        }
    }

    pub fn total_items(&self) -> u64 {
        self.total_items.load(Ordering::Relaxed)
    }

    pub fn unparsed(&self) -> u64 {
        self.unparsed.load(Ordering::Relaxed)
    }

    pub fn merged_segments(&self) -> u64 {
        self.merged_segments.load(Ordering::Relaxed)
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.tally.lock().get(key).copied()
    }

    /// Ordered copy of the current tally
    pub fn snapshot(&self) -> GlobalTally {
        self.tally
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
