use serde::Serialize;
use thiserror::Error;

use crate::domain::errors::ValidationError;

/// Coarse classification of a gateway failure, stable across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotConnected,
    AlreadyExists,
    NotFound,
    InvalidName,
    InvalidParameter,
    NotSupported,
    BackendError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::NotSupported => "not_supported",
            ErrorKind::BackendError => "backend_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by every gateway operation
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No live backend and mock fallback is disabled
    #[error("Not connected to storage backend: {message}")]
    NotConnected { message: String },

    #[error("Bucket already exists: {bucket}")]
    BucketAlreadyExists { bucket: String },

    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Invalid bucket name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Operation '{operation}' not supported: {reason}")]
    NotSupported { operation: String, reason: String },

    /// The backend answered, but with an error we pass through verbatim
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// The backend could not be reached at the transport level
    #[error("Storage backend unreachable: {message}")]
    Unreachable { message: String },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotConnected { .. } => ErrorKind::NotConnected,
            GatewayError::BucketAlreadyExists { .. } => ErrorKind::AlreadyExists,
            GatewayError::BucketNotFound { .. } | GatewayError::ObjectNotFound { .. } => {
                ErrorKind::NotFound
            }
            GatewayError::InvalidName { .. } => ErrorKind::InvalidName,
            GatewayError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            GatewayError::NotSupported { .. } => ErrorKind::NotSupported,
            GatewayError::Backend { .. } | GatewayError::Unreachable { .. } => {
                ErrorKind::BackendError
            }
        }
    }

    /// True when the failure says the connection itself is bad, so the cached
    /// handle must not be trusted for the next call.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, GatewayError::Unreachable { .. })
    }

    pub fn bucket_not_found(bucket: impl Into<String>) -> Self {
        GatewayError::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    pub fn object_not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        GatewayError::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        GatewayError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        GatewayError::Backend {
            message: message.into(),
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidBucketName { name, reason } => {
                GatewayError::InvalidName { name, reason }
            }
            other => GatewayError::InvalidParameter {
                message: other.to_string(),
            },
        }
    }
}

/// Convert gateway errors to HTTP status codes for API responses
impl From<&GatewayError> for http::StatusCode {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::InvalidName { .. } | GatewayError::InvalidParameter { .. } => {
                http::StatusCode::BAD_REQUEST
            }
            GatewayError::BucketNotFound { .. } | GatewayError::ObjectNotFound { .. } => {
                http::StatusCode::NOT_FOUND
            }
            GatewayError::BucketAlreadyExists { .. } => http::StatusCode::CONFLICT,
            GatewayError::NotSupported { .. } => http::StatusCode::NOT_IMPLEMENTED,
            GatewayError::Backend { .. } => http::StatusCode::BAD_GATEWAY,
            GatewayError::NotConnected { .. } | GatewayError::Unreachable { .. } => {
                http::StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
