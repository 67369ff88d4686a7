//! Report rendering

use anyhow::Result;
use std::fmt::Write;
use tallyscan::{ScanComparison, ScanReport, SegmentStatus};

use crate::cli::OutputFormat;

pub fn report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(report_text(report)),
    }
}

pub fn comparison(comparison: &ScanComparison, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(comparison)?),
        OutputFormat::Text => Ok(comparison_text(comparison)),
    }
}

pub fn tables(names: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(names)?),
        OutputFormat::Text => Ok(names.iter().map(|n| format!("{}\n", n)).collect()),
    }
}

fn report_text(report: &ScanReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Table: {}", report.table_name);
    for segment in &report.segments {
        let _ = write!(
            out,
            "  {:<16} {:>10} items {:>6} pages {:>9}ms  {}",
            segment.mode.to_string(),
            segment.result.item_count,
            segment.pages,
            segment.elapsed_ms,
            segment.status.as_str()
        );
        if let SegmentStatus::Failed { reason } = &segment.status {
            let _ = write!(out, " ({})", reason);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Total items:    {}", report.total_items);
    if report.unparsed_records > 0 {
        let _ = writeln!(out, "Unparsed:       {}", report.unparsed_records);
    }
    let _ = writeln!(out, "Status:         {}", report.status.as_str());
    let _ = writeln!(
        out,
        "Elapsed:        {}ms ({:.0} items/s)",
        report.elapsed_ms,
        report.throughput()
    );
    if report.timed_out {
        out.push_str("Scan deadline reached\n");
    }
    if report.cancelled {
        out.push_str("Scan cancelled\n");
    }

    let _ = writeln!(out, "Keys:           {}", report.tally.len());
    let width = report.tally.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, count) in &report.tally {
        let _ = writeln!(out, "  {:<width$}  {}", key, count, width = width);
    }

    out
}

fn comparison_text(comparison: &ScanComparison) -> String {
    let mut out = String::new();
    out.push_str("== Full-table scan ==\n");
    out.push_str(&report_text(&comparison.unsegmented));
    out.push_str("\n== Parallel scan ==\n");
    out.push_str(&report_text(&comparison.parallel));
    let _ = writeln!(out, "\nSpeedup:        {:.2}x", comparison.speedup());
    if !comparison.counts_match() {
        let _ = writeln!(
            out,
            "Item counts differ ({} vs {})",
            comparison.unsegmented.total_items, comparison.parallel.total_items
        );
    }
    out
}
