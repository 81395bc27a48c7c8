//! Shared HTTP plumbing: envelope, error mapping, validated extractors

mod response;
mod validated_json;

pub use response::{ApiError, ApiResponse, ApiResult, INVALID_DATA_MESSAGE};
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
