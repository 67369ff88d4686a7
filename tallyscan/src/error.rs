//! Scan error types

use thiserror::Error;

/// Errors reported by a [`TableStore`](crate::store::TableStore) for a single read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the same read may succeed if issued again
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Throttled(_) | StoreError::Transient(_))
    }

    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            StoreError::Throttled(_) => "throttled",
            StoreError::Transient(_) => "transient",
            StoreError::TableNotFound(_) => "table_not_found",
            StoreError::PermissionDenied(_) => "permission_denied",
            StoreError::InvalidRequest(_) => "invalid_request",
            StoreError::Backend(_) => "backend",
        }
    }
}

/// Why a record's partition key could not be extracted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("attribute '{attribute}' is missing")]
    Missing { attribute: String },

    #[error("attribute '{attribute}' has unsupported type {found}")]
    UnsupportedType {
        attribute: String,
        found: &'static str,
    },
}

impl KeyError {
    /// Short reason used as the skip bucket in segment results
    pub fn reason(&self) -> &'static str {
        match self {
            KeyError::Missing { .. } => "missing",
            KeyError::UnsupportedType { .. } => "unsupported_type",
        }
    }
}

/// Errors that stop a segment or reject a scan job
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: StoreError },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Pagination stalled on {segment}: store returned a cursor it already served")]
    StalledCursor { segment: String },

    #[error("Invalid scan job: {0}")]
    InvalidJob(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl ScanError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            ScanError::Store(e) => e.error_type(),
            ScanError::RetriesExhausted { .. } => "retries_exhausted",
            ScanError::Timeout(_) => "timeout",
            ScanError::Cancelled => "cancelled",
            ScanError::StalledCursor { .. } => "stalled_cursor",
            ScanError::InvalidJob(_) => "invalid_job",
            ScanError::Config(_) => "config",
            ScanError::Worker(_) => "worker",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type for store reads.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
