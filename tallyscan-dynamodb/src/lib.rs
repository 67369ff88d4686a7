//! DynamoDB backend for tallyscan
//!
//! Implements [`tallyscan::TableStore`] on top of the DynamoDB `Scan` and
//! `ListTables` operations. Page cursors are the raw `LastEvaluatedKey` maps
//! returned by the service and are passed back unchanged as
//! `ExclusiveStartKey`.
//!
//! SDK-level retries are disabled; retry and backoff are handled by
//! [`tallyscan::PageFetcher`] so throttling is visible in scan metrics.

mod config;
mod convert;
mod error;
mod store;

pub use config::DynamoDbConfig;
pub use convert::{attribute_to_json, item_to_record};
pub use error::{classify_code, classify_sdk_error};
pub use store::{DynamoDbCursor, DynamoDbStore};
