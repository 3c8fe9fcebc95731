use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{
    errors::{ErrorKind, GatewayError},
    models::{GatewayMode, ObjectSummary, UploadReceipt},
};

/// Default lifetime of a presigned URL, in seconds
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponseDto>);
pub type ApiResult<T> = Result<T, ApiError>;

/// DTO for creating a bucket
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBucketDto {
    #[serde(alias = "name")]
    pub bucket_name: Option<String>,
}

/// DTO for bucket list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketListResponseDto {
    pub buckets: Vec<String>,
    pub count: usize,
    pub mode: GatewayMode,
}

/// DTO for bucket create/delete responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketResponseDto {
    pub success: bool,
    pub bucket: String,
    pub message: String,
    pub mode: GatewayMode,
}

/// DTO for object information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfoDto {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

impl From<ObjectSummary> for ObjectInfoDto {
    fn from(summary: ObjectSummary) -> Self {
        Self {
            key: summary.key,
            size: summary.size,
            last_modified: summary.last_modified,
            etag: summary.etag,
        }
    }
}

/// DTO for object list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListObjectsResponseDto {
    pub bucket: String,
    pub objects: Vec<ObjectInfoDto>,
    pub count: usize,
    pub mode: GatewayMode,
}

/// DTO for upload responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponseDto {
    pub success: bool,
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub bucket_created: bool,
    pub mode: GatewayMode,
}

impl UploadResponseDto {
    pub fn new(receipt: UploadReceipt, mode: GatewayMode) -> Self {
        Self {
            success: true,
            bucket: receipt.bucket,
            key: receipt.key,
            size: receipt.size,
            bucket_created: receipt.bucket_created,
            mode,
        }
    }
}

/// DTO for object delete responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteObjectResponseDto {
    pub success: bool,
    pub bucket: String,
    pub key: String,
    pub mode: GatewayMode,
}

/// Query parameters for presigned URLs
#[derive(Debug, Clone, Deserialize)]
pub struct PresignedUrlQuery {
    pub key: Option<String>,
    pub expires_in: Option<u64>,
}

/// DTO for presigned URL responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrlResponseDto {
    pub url: String,
    pub bucket: String,
    pub key: String,
    pub expires_in: u64,
    pub mode: GatewayMode,
}

/// DTO for the detailed health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponseDto {
    pub status: String,
    pub service: String,
    pub mode: GatewayMode,
    pub components: HashMap<String, String>,
    pub endpoint: Option<String>,
    pub last_error: Option<String>,
    pub reconnect_backoff_secs: u64,
    pub timestamp: DateTime<Utc>,
}

/// DTO for error responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
    pub mode: GatewayMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponseDto {
    pub fn from_gateway_error(error: &GatewayError, mode: GatewayMode) -> Self {
        let mut details = HashMap::new();

        match error {
            GatewayError::BucketNotFound { bucket }
            | GatewayError::BucketAlreadyExists { bucket } => {
                details.insert("bucket".to_string(), bucket.clone());
            }
            GatewayError::ObjectNotFound { bucket, key } => {
                details.insert("bucket".to_string(), bucket.clone());
                details.insert("key".to_string(), key.clone());
            }
            GatewayError::InvalidName { name, .. } => {
                details.insert("name".to_string(), name.clone());
            }
            _ => {}
        }

        Self {
            error: error.kind().as_str().to_string(),
            message: error.to_string(),
            mode,
            details: if details.is_empty() {
                None
            } else {
                Some(details)
            },
            timestamp: Utc::now(),
        }
    }

    pub fn bad_request(message: impl Into<String>, mode: GatewayMode) -> Self {
        Self {
            error: ErrorKind::InvalidParameter.as_str().to_string(),
            message: message.into(),
            mode,
            details: None,
            timestamp: Utc::now(),
        }
    }
}

/// Pair a gateway error with its HTTP status
pub fn api_error(error: GatewayError, mode: GatewayMode) -> ApiError {
    let status = StatusCode::from(&error);
    if status.is_server_error() {
        tracing::warn!(kind = %error.kind(), error = %error, "Request failed");
    }
    (status, Json(ErrorResponseDto::from_gateway_error(&error, mode)))
}

/// 400 for a missing or malformed request parameter
pub fn bad_request(message: impl Into<String>, mode: GatewayMode) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponseDto::bad_request(message, mode)),
    )
}
