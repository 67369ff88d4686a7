//! Scan configuration

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main scan configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Attribute whose value is tallied
    #[serde(default = "default_key_attribute")]
    pub key_attribute: String,

    /// Maximum items evaluated per read (store default when unset)
    #[serde(default)]
    pub page_limit: Option<u32>,

    /// Request strongly consistent reads
    #[serde(default)]
    pub consistent_read: bool,

    /// Deadline for a single segment's pagination loop
    #[serde(default)]
    pub segment_timeout_ms: Option<u64>,

    /// Deadline for the whole coordinated scan
    #[serde(default)]
    pub scan_timeout_ms: Option<u64>,

    /// Backoff policy for retryable store errors
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_key_attribute() -> String {
    "logGroup".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            key_attribute: default_key_attribute(),
            page_limit: None,
            consistent_read: false,
            segment_timeout_ms: None,
            scan_timeout_ms: None,
            retry: RetryConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_attribute.trim().is_empty() {
            return Err(ScanError::Config("key_attribute must not be empty".into()));
        }
        if self.page_limit == Some(0) {
            return Err(ScanError::Config("page_limit must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScanError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ScanError::Config(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn segment_timeout(&self) -> Option<Duration> {
        self.segment_timeout_ms.map(Duration::from_millis)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_ms.map(Duration::from_millis)
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts per page, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    50
}

fn default_max_backoff() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}
