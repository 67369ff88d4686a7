//! SDK error classification

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;
use tallyscan::StoreError;

/// Map an SDK failure onto a [`StoreError`].
///
/// Network, dispatch and malformed-response failures are transient. Service
/// errors are classified by their error code.
pub fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    match err {
        SdkError::ConstructionFailure(_) => StoreError::InvalidRequest(message),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StoreError::Transient(message)
        }
        SdkError::ServiceError(service) => classify_code(service.err().code(), message),
        _ => StoreError::Backend(message),
    }
}

/// Classify a DynamoDB service error code
pub fn classify_code(code: Option<&str>, message: String) -> StoreError {
    match code {
        Some(
            "ProvisionedThroughputExceededException"
            | "RequestLimitExceeded"
            | "ThrottlingException",
        ) => StoreError::Throttled(message),
        Some("InternalServerError" | "ServiceUnavailable") => StoreError::Transient(message),
        Some("ResourceNotFoundException") => StoreError::TableNotFound(message),
        Some("AccessDeniedException" | "UnrecognizedClientException") => {
            StoreError::PermissionDenied(message)
        }
        Some("ValidationException") => StoreError::InvalidRequest(message),
        _ => StoreError::Backend(message),
    }
}
