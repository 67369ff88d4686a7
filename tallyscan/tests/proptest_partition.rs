//! Property-based checks of segment coverage and pagination termination.
//!
//! Uses `proptest` to generate table sizes, segment counts and page sizes and
//! verifies that segments are disjoint, cover the table, and that every
//! pagination loop ends with the expected item count.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tallyscan::{
    CancellationToken, MemoryStore, PageFetcher, Record, ScanConfig, ScanCoordinator,
    ScanJobSpec, ScanMode,
};

fn store(records: usize, page_size: usize) -> Arc<MemoryStore> {
    let store = MemoryStore::new().with_page_size(page_size);
    store.insert_table(
        "t",
        (0..records)
            .map(|i| {
                Record::new()
                    .with_field("id", i as u64)
                    .with_field("logGroup", format!("g{}", i % 7))
            })
            .collect(),
    );
    Arc::new(store)
}

/// Page through one segment collecting record ids
async fn collect_ids(fetcher: &PageFetcher<MemoryStore>, mode: ScanMode) -> Vec<u64> {
    let cancel = CancellationToken::new();
    let mut ids = Vec::new();
    let mut cursor = None;
    loop {
        let page = fetcher.fetch("t", mode, cursor.as_ref(), &cancel).await.unwrap();
        ids.extend(
            page.records
                .iter()
                .map(|r| r.get("id").and_then(|v| v.as_u64()).unwrap()),
        );
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn test_segments_partition_the_table(
        records in 0usize..300,
        total in 1u32..16,
        page_size in 1usize..25,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fetcher = PageFetcher::new(store(records, page_size), &ScanConfig::default());
            let mut seen = HashSet::new();
            let mut observed = 0usize;

            for index in 0..total {
                let ids = collect_ids(&fetcher, ScanMode::Segmented { index, total }).await;
                observed += ids.len();
                for id in ids {
                    assert!(seen.insert(id), "record {} appeared in two segments", id);
                }
            }

            assert_eq!(observed, records);
            let expected: HashSet<u64> = (0..records as u64).collect();
            assert_eq!(seen, expected);
        });
    }

    #[test]
    fn test_coordinated_totals_match_table(
        records in 0usize..200,
        total in 1u32..12,
        page_size in 1usize..20,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let coordinator =
                ScanCoordinator::new(store(records, page_size), ScanConfig::default()).unwrap();
            let report = coordinator
                .run_parallel_scan(&ScanJobSpec::new("t", total).unwrap())
                .await;

            assert!(report.is_complete());
            assert_eq!(report.total_items, records as u64);
            assert_eq!(report.tallied(), records as u64);

            for segment in &report.segments {
                let index = segment.mode.index().unwrap() as usize;
                let len = if index < records {
                    (records - index).div_ceil(total as usize)
                } else {
                    0
                };
                let expected_pages = len.div_ceil(page_size).max(1) as u64;
                assert_eq!(segment.result.item_count, len as u64);
                assert_eq!(segment.pages, expected_pages, "segment {}", index);
            }
        });
    }
}
