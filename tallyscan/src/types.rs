//! Core scan data types: modes, job specs, records, pages and segment results

use crate::error::{KeyError, Result, ScanError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Upper bound on `TotalSegments` accepted by DynamoDB
pub const MAX_TOTAL_SEGMENTS: u32 = 1_000_000;

/// Which part of a table a single read covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScanMode {
    /// The whole table as a single segment
    Unsegmented,
    /// One disjoint slice of the table
    Segmented { index: u32, total: u32 },
}

impl ScanMode {
    /// Build a segmented mode, checking `index < total`
    pub fn segmented(index: u32, total: u32) -> Result<Self> {
        if total == 0 || total > MAX_TOTAL_SEGMENTS {
            return Err(ScanError::InvalidJob(format!(
                "total segments must be in 1..={}, got {}",
                MAX_TOTAL_SEGMENTS, total
            )));
        }
        if index >= total {
            return Err(ScanError::InvalidJob(format!(
                "segment index {} out of range for {} segments",
                index, total
            )));
        }
        Ok(ScanMode::Segmented { index, total })
    }

    /// Segment index, if segmented
    pub fn index(&self) -> Option<u32> {
        match self {
            ScanMode::Unsegmented => None,
            ScanMode::Segmented { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Unsegmented => write!(f, "full table"),
            ScanMode::Segmented { index, total } => write!(f, "segment {}/{}", index, total),
        }
    }
}

/// How a job divides the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum SegmentPlan {
    Unsegmented,
    Segmented { total: u32 },
}

/// A single coordinated scan request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanJobSpec {
    table_name: String,
    plan: SegmentPlan,
}

impl ScanJobSpec {
    /// Parallel scan of `table_name` split into `total_segments` segments
    pub fn new(table_name: impl Into<String>, total_segments: u32) -> Result<Self> {
        let table_name = Self::check_table(table_name.into())?;
        // Validates the range; segment 0 always exists.
        ScanMode::segmented(0, total_segments)?;
        Ok(Self {
            table_name,
            plan: SegmentPlan::Segmented {
                total: total_segments,
            },
        })
    }

    /// Sequential scan of the whole table
    pub fn unsegmented(table_name: impl Into<String>) -> Result<Self> {
        let table_name = Self::check_table(table_name.into())?;
        Ok(Self {
            table_name,
            plan: SegmentPlan::Unsegmented,
        })
    }

    fn check_table(table_name: String) -> Result<String> {
        if table_name.trim().is_empty() {
            return Err(ScanError::InvalidJob("table name is empty".to_string()));
        }
        Ok(table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn plan(&self) -> SegmentPlan {
        self.plan
    }

    /// Same table, scanned without segmentation
    pub fn as_unsegmented(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            plan: SegmentPlan::Unsegmented,
        }
    }

    /// One mode per worker the coordinator will spawn
    pub fn modes(&self) -> Vec<ScanMode> {
        match self.plan {
            SegmentPlan::Unsegmented => vec![ScanMode::Unsegmented],
            SegmentPlan::Segmented { total } => (0..total)
                .map(|index| ScanMode::Segmented { index, total })
                .collect(),
        }
    }

    pub fn worker_count(&self) -> u32 {
        match self.plan {
            SegmentPlan::Unsegmented => 1,
            SegmentPlan::Segmented { total } => total,
        }
    }
}

/// A raw record as returned by the store
///
/// Only the partition-key attribute is interpreted; everything else is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insert
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Extract the grouping key from `attribute`.
    ///
    /// Strings are used verbatim and numbers by their decimal text; any other
    /// type is rejected.
    pub fn partition_key(&self, attribute: &str) -> std::result::Result<String, KeyError> {
        match self.fields.get(attribute) {
            None | Some(Value::Null) => Err(KeyError::Missing {
                attribute: attribute.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(KeyError::UnsupportedType {
                attribute: attribute.to_string(),
                found: json_type_name(other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One bounded read worth of records
#[derive(Debug, Clone, PartialEq)]
pub struct Page<C> {
    pub records: Vec<Record>,
    /// Item count as reported by the store
    pub count: u64,
    /// Where the next read resumes; `None` when the segment is exhausted
    pub next_cursor: Option<C>,
}

impl<C> Page<C> {
    /// Page whose count is the number of records it carries
    pub fn new(records: Vec<Record>, next_cursor: Option<C>) -> Self {
        let count = records.len() as u64;
        Self {
            records,
            count,
            next_cursor,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Per-segment partial result: item count and local key tally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub item_count: u64,
    pub tally: HashMap<String, u64>,
    /// Records skipped because their key could not be extracted
    pub unparsed: u64,
    /// Skipped records bucketed by reason
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skip_reasons: BTreeMap<String, u64>,
}

impl SegmentResult {
    /// Count one occurrence of `key`
    pub fn record_key(&mut self, key: String) {
        *self.tally.entry(key).or_insert(0) += 1;
    }

    /// Count one skipped record
    pub fn record_skip(&mut self, err: &KeyError) {
        self.unparsed += 1;
        *self.skip_reasons.entry(err.reason().to_string()).or_insert(0) += 1;
    }

    /// Sum of all tally values
    pub fn tallied(&self) -> u64 {
        self.tally.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segmented_mode_bounds() {
        assert!(ScanMode::segmented(0, 1).is_ok());
        assert!(ScanMode::segmented(19, 20).is_ok());
        assert!(ScanMode::segmented(20, 20).is_err());
        assert!(ScanMode::segmented(0, 0).is_err());
        assert!(ScanMode::segmented(0, MAX_TOTAL_SEGMENTS + 1).is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ScanMode::Unsegmented.to_string(), "full table");
        assert_eq!(
            ScanMode::Segmented { index: 3, total: 20 }.to_string(),
            "segment 3/20"
        );
    }

    #[test]
    fn test_job_modes() {
        let job = ScanJobSpec::new("logs", 4).unwrap();
        let modes = job.modes();
        assert_eq!(modes.len(), 4);
        assert_eq!(modes[0], ScanMode::Segmented { index: 0, total: 4 });
        assert_eq!(modes[3], ScanMode::Segmented { index: 3, total: 4 });
        assert_eq!(job.worker_count(), 4);

        let job = ScanJobSpec::unsegmented("logs").unwrap();
        assert_eq!(job.modes(), vec![ScanMode::Unsegmented]);
        assert_eq!(job.worker_count(), 1);
    }

    #[test]
    fn test_job_rejects_bad_input() {
        assert!(ScanJobSpec::new("logs", 0).is_err());
        assert!(ScanJobSpec::new("  ", 4).is_err());
        assert!(ScanJobSpec::unsegmented("").is_err());
    }

    #[test]
    fn test_as_unsegmented_keeps_table() {
        let job = ScanJobSpec::new("logs", 8).unwrap();
        let seq = job.as_unsegmented();
        assert_eq!(seq.table_name(), "logs");
        assert_eq!(seq.plan(), SegmentPlan::Unsegmented);
    }

    #[test]
    fn test_partition_key_extraction() {
        let record = Record::new()
            .with_field("logGroup", "/aws/lambda/ingest")
            .with_field("shard", 42)
            .with_field("tags", json!(["a"]))
            .with_field("gone", Value::Null);

        assert_eq!(record.partition_key("logGroup").unwrap(), "/aws/lambda/ingest");
        assert_eq!(record.partition_key("shard").unwrap(), "42");
        assert_eq!(
            record.partition_key("tags"),
            Err(KeyError::UnsupportedType {
                attribute: "tags".into(),
                found: "array"
            })
        );
        assert_eq!(
            record.partition_key("gone"),
            Err(KeyError::Missing {
                attribute: "gone".into()
            })
        );
        assert!(record.partition_key("absent").is_err());
    }

    #[test]
    fn test_page_count_matches_records() {
        let page: Page<u32> = Page::new(vec![Record::new(), Record::new()], Some(7));
        assert_eq!(page.count, 2);
        assert!(!page.is_last());
    }

    #[test]
    fn test_segment_result_counting() {
        let mut result = SegmentResult::default();
        result.record_key("a".into());
        result.record_key("a".into());
        result.record_key("b".into());
        result.record_skip(&KeyError::Missing {
            attribute: "logGroup".into(),
        });

        assert_eq!(result.tally["a"], 2);
        assert_eq!(result.tallied(), 3);
        assert_eq!(result.unparsed, 1);
        assert_eq!(result.skip_reasons["missing"], 1);
    }

    #[test]
    fn test_mode_serde_tagged() {
        let json = serde_json::to_value(ScanMode::Segmented { index: 1, total: 2 }).unwrap();
        assert_eq!(json, json!({"mode": "segmented", "index": 1, "total": 2}));
        let json = serde_json::to_value(ScanMode::Unsegmented).unwrap();
        assert_eq!(json, json!({"mode": "unsegmented"}));
    }
}
