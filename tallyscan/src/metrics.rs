//! Scan observability metrics
//!
//! Recorded through the `metrics` facade; nothing is emitted unless the host
//! process installs a recorder.

use std::time::Duration;

/// Record one store read
pub fn record_page_fetch(store: &str, duration: Duration, success: bool) {
    let status = if success { "ok" } else { "error" };
    metrics::histogram!(
        "tallyscan_page_fetch_duration_seconds",
        "store" => store.to_string(),
    )
    .record(duration.as_secs_f64());

    metrics::counter!(
        "tallyscan_page_fetches_total",
        "store" => store.to_string(),
        "status" => status,
    )
    .increment(1);
}

/// Record a retried read
pub fn record_retry(store: &str, error_type: &str) {
    metrics::counter!(
        "tallyscan_retries_total",
        "store" => store.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record a finished segment
pub fn record_segment(status: &str, items: u64, unparsed: u64, duration: Duration) {
    metrics::counter!(
        "tallyscan_segments_total",
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!("tallyscan_segment_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("tallyscan_items_scanned_total").increment(items);

    if unparsed > 0 {
        metrics::counter!("tallyscan_unparsed_records_total").increment(unparsed);
    }
}

/// Record a finished coordinated scan
pub fn record_scan(table: &str, status: &str, items: u64, duration: Duration) {
    metrics::counter!(
        "tallyscan_scans_total",
        "table" => table.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "tallyscan_scan_duration_seconds",
        "table" => table.to_string(),
    )
    .record(duration.as_secs_f64());

    metrics::gauge!(
        "tallyscan_last_scan_items",
        "table" => table.to_string(),
    )
    .set(items as f64);
}
