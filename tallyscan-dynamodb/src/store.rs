use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use aws_smithy_types::retry::RetryConfig;
use aws_smithy_types::timeout::TimeoutConfig;
use std::collections::HashMap;
use tallyscan::{Page, PageRequest, ScanMode, StoreError, StoreResult, TableStore};
use tracing::{debug, info};

use crate::config::DynamoDbConfig;
use crate::convert::item_to_record;
use crate::error::classify_sdk_error;

/// `LastEvaluatedKey` of a scan page
pub type DynamoDbCursor = HashMap<String, AttributeValue>;

/// [`TableStore`] backed by the DynamoDB `Scan` API
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Build a client from the shared AWS config chain plus `config` overrides
    pub async fn connect(config: &DynamoDbConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .retry_config(RetryConfig::disabled());

        if let Some(region) = &config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(timeout) = config.operation_timeout() {
            builder = builder.timeout_config(
                TimeoutConfig::builder().operation_timeout(timeout).build(),
            );
        }

        info!(
            "DynamoDB client ready (region: {}, endpoint: {})",
            config.region.as_deref().unwrap_or("sdk default"),
            config.endpoint.as_deref().unwrap_or("sdk default")
        );
        Self::from_client(Client::from_conf(builder.build()))
    }

    /// Wrap a pre-built client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// `Segment` / `TotalSegments` parameters for a scan mode
fn segment_params(mode: ScanMode) -> StoreResult<(Option<i32>, Option<i32>)> {
    match mode {
        ScanMode::Unsegmented => Ok((None, None)),
        ScanMode::Segmented { index, total } => {
            let index = i32::try_from(index).map_err(|_| {
                StoreError::InvalidRequest(format!("segment {} out of range", index))
            })?;
            let total = i32::try_from(total).map_err(|_| {
                StoreError::InvalidRequest(format!("total segments {} out of range", total))
            })?;
            Ok((Some(index), Some(total)))
        }
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    type Cursor = DynamoDbCursor;

    async fn scan_page(
        &self,
        request: PageRequest<'_, DynamoDbCursor>,
    ) -> StoreResult<Page<DynamoDbCursor>> {
        let (segment, total_segments) = segment_params(request.mode)?;
        let limit = request
            .limit
            .map(|l| i32::try_from(l).unwrap_or(i32::MAX));

        let output = self
            .client
            .scan()
            .table_name(request.table)
            .consistent_read(request.consistent_read)
            .set_segment(segment)
            .set_total_segments(total_segments)
            .set_limit(limit)
            .set_exclusive_start_key(request.cursor.cloned())
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let records: Vec<_> = output.items().iter().map(item_to_record).collect();
        let next_cursor = output
            .last_evaluated_key()
            .filter(|key| !key.is_empty())
            .cloned();

        debug!(
            "Scan page of {} ({}): {} items, more: {}",
            request.table,
            request.mode,
            output.count(),
            next_cursor.is_some()
        );

        Ok(Page {
            records,
            count: output.count().max(0) as u64,
            next_cursor,
        })
    }

    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    fn store_name(&self) -> &str {
        "dynamodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_params() {
        assert_eq!(segment_params(ScanMode::Unsegmented).unwrap(), (None, None));
        assert_eq!(
            segment_params(ScanMode::Segmented { index: 3, total: 20 }).unwrap(),
            (Some(3), Some(20))
        );
        assert!(matches!(
            segment_params(ScanMode::Segmented {
                index: 0,
                total: u32::MAX
            }),
            Err(StoreError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_with_local_endpoint() {
        let config = DynamoDbConfig {
            region: Some("eu-north-1".into()),
            endpoint: Some("http://127.0.0.1:8000".into()),
            timeout_ms: Some(1000),
        };
        let store = DynamoDbStore::connect(&config).await;

        assert_eq!(store.store_name(), "dynamodb");
        let conf = store.client().config();
        assert_eq!(conf.region().map(|r| r.as_ref()), Some("eu-north-1"));
    }
}
