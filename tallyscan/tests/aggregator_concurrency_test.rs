//! Concurrent merges into the shared tally must not lose updates.

use std::collections::HashMap;
use std::sync::Arc;
use tallyscan::{Aggregator, SegmentResult};

fn single_key(key: &str) -> SegmentResult {
    SegmentResult {
        item_count: 1,
        tally: HashMap::from([(key.to_string(), 1)]),
        ..SegmentResult::default()
    }
}

/// N workers each merging {k:1} M times yields exactly N*M
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_merges_of_one_key() {
    const WORKERS: u64 = 16;
    const MERGES: u64 = 500;

    let aggregator = Arc::new(Aggregator::new());
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let aggregator = Arc::clone(&aggregator);
            tokio::spawn(async move {
                let result = single_key("k");
                for i in 0..MERGES {
                    aggregator.merge(&result);
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(aggregator.get("k"), Some(WORKERS * MERGES));
    assert_eq!(aggregator.total_items(), WORKERS * MERGES);
    assert_eq!(aggregator.merged_segments(), WORKERS * MERGES);
}

#[test]
fn test_threaded_increments_mixed_keys() {
    const THREADS: u64 = 8;
    const ROUNDS: u64 = 1_000;

    let aggregator = Aggregator::new();
    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let aggregator = &aggregator;
            scope.spawn(move || {
                for r in 0..ROUNDS {
                    aggregator.increment("shared", 1);
                    aggregator.increment(&format!("own-{}", t), 1);
                    if r % 2 == 0 {
                        aggregator.increment("even", 2);
                    }
                }
            });
        }
    });

    let tally = aggregator.snapshot();
    assert_eq!(tally["shared"], THREADS * ROUNDS);
    assert_eq!(tally["even"], THREADS * ROUNDS);
    for t in 0..THREADS {
        assert_eq!(tally[&format!("own-{}", t)], ROUNDS);
    }
}

/// {a:3,b:1} and {a:2,c:4} merged from two tasks in either order
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_merge_commutes_under_concurrency() {
    for _ in 0..50 {
        let aggregator = Arc::new(Aggregator::new());
        let first = SegmentResult {
            item_count: 4,
            tally: HashMap::from([("a".to_string(), 3), ("b".to_string(), 1)]),
            ..SegmentResult::default()
        };
        let second = SegmentResult {
            item_count: 6,
            tally: HashMap::from([("a".to_string(), 2), ("c".to_string(), 4)]),
            ..SegmentResult::default()
        };

        let a = {
            let aggregator = Arc::clone(&aggregator);
            tokio::spawn(async move { aggregator.merge(&first) })
        };
        let b = {
            let aggregator = Arc::clone(&aggregator);
            tokio::spawn(async move { aggregator.merge(&second) })
        };
        a.await.unwrap();
        b.await.unwrap();

        let tally = aggregator.snapshot();
        assert_eq!(tally["a"], 5);
        assert_eq!(tally["b"], 1);
        assert_eq!(tally["c"], 4);
        assert_eq!(aggregator.total_items(), 10);
    }
}
