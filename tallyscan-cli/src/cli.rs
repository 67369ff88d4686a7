use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default table, matching the aggregated CloudWatch log table the tool was written for
pub const DEFAULT_TABLE: &str = "test-cec-aggregated-logs";
pub const DEFAULT_SEGMENTS: u32 = 20;

#[derive(Parser, Debug)]
#[command(name = "tallyscan")]
#[command(about = "Parallel segmented scan of a DynamoDB table, tallying partition keys")]
#[command(version)]
pub struct Cli {
    /// Table to scan
    #[arg(short, long, env = "TALLYSCAN_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Number of parallel segments
    #[arg(short, long, env = "TALLYSCAN_SEGMENTS", default_value_t = DEFAULT_SEGMENTS)]
    pub segments: u32,

    /// Scan the whole table with a single worker
    #[arg(long, conflicts_with = "compare")]
    pub unsegmented: bool,

    /// Run an unsegmented scan and then the parallel scan, and compare timings
    #[arg(long)]
    pub compare: bool,

    /// List tables and exit
    #[arg(long)]
    pub list_tables: bool,

    /// TOML file with [scan] and [dynamodb] sections
    #[arg(short, long, env = "TALLYSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attribute whose values are tallied
    #[arg(long)]
    pub key_attribute: Option<String>,

    /// Maximum items evaluated per read
    #[arg(long)]
    pub page_limit: Option<u32>,

    /// Request strongly consistent reads
    #[arg(long)]
    pub consistent_read: bool,

    /// Deadline for each segment in milliseconds
    #[arg(long)]
    pub segment_timeout_ms: Option<u64>,

    /// Deadline for the whole scan in milliseconds
    #[arg(long)]
    pub scan_timeout_ms: Option<u64>,

    /// Attempts per page before giving up on retryable errors
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// AWS region (the SDK chain, e.g. AWS_REGION, when unset)
    #[arg(long)]
    pub region: Option<String>,

    /// DynamoDB endpoint override (DynamoDB Local, LocalStack)
    #[arg(long, env = "TALLYSCAN_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Log format
    #[arg(long, value_enum, env = "TALLYSCAN_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}
