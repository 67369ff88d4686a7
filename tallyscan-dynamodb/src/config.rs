use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for [`DynamoDbStore`](crate::DynamoDbStore)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamoDbConfig {
    /// AWS region (optional, uses the SDK default chain)
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override, e.g. DynamoDB Local or LocalStack
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Per-operation timeout in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl DynamoDbConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
