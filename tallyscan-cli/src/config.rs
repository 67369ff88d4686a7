//! Config file plus command-line overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tallyscan::ScanConfig;
use tallyscan_dynamodb::DynamoDbConfig;

use crate::cli::Cli;

/// Contents of the optional `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub dynamodb: DynamoDbConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Load the file named by `--config` (if any) and apply flag overrides
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config.scan.validate()?;
        Ok(config)
    }

    fn apply(&mut self, cli: &Cli) {
        let scan = &mut self.scan;
        if let Some(attr) = &cli.key_attribute {
            scan.key_attribute = attr.clone();
        }
        if cli.page_limit.is_some() {
            scan.page_limit = cli.page_limit;
        }
        if cli.consistent_read {
            scan.consistent_read = true;
        }
        if cli.segment_timeout_ms.is_some() {
            scan.segment_timeout_ms = cli.segment_timeout_ms;
        }
        if cli.scan_timeout_ms.is_some() {
            scan.scan_timeout_ms = cli.scan_timeout_ms;
        }
        if let Some(attempts) = cli.max_attempts {
            scan.retry.max_attempts = attempts;
        }

        let dynamodb = &mut self.dynamodb;
        if cli.region.is_some() {
            dynamodb.region = cli.region.clone();
        }
        if cli.endpoint_url.is_some() {
            dynamodb.endpoint = cli.endpoint_url.clone();
        }
        if cli.request_timeout_ms.is_some() {
            dynamodb.timeout_ms = cli.request_timeout_ms;
        }
    }
}
