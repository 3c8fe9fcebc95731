use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
};
use std::error::Error as StdError;

use crate::domain::errors::GatewayError;

/// S3 error codes the gateway distinguishes
const NO_SUCH_BUCKET: &str = "NoSuchBucket";
const NOT_FOUND: &str = "NotFound";
const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";
const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
const INVALID_BUCKET_NAME: &str = "InvalidBucketName";
const NO_SUCH_KEY: &str = "NoSuchKey";

/// Translate an `object_store` failure on `bucket/key` into a gateway error
pub fn from_object_store_error(err: object_store::Error, bucket: &str, key: &str) -> GatewayError {
    match err {
        object_store::Error::NotFound { .. } => GatewayError::object_not_found(bucket, key),
        object_store::Error::InvalidPath { source } => {
            GatewayError::invalid_parameter(format!("Invalid object path: {}", source))
        }
        object_store::Error::NotSupported { source } => GatewayError::NotSupported {
            operation: "object_store".to_string(),
            reason: source.to_string(),
        },
        object_store::Error::NotImplemented => GatewayError::NotSupported {
            operation: "object_store".to_string(),
            reason: "not implemented by this store".to_string(),
        },
        other => {
            if is_transport_failure(&other) {
                GatewayError::Unreachable {
                    message: other.to_string(),
                }
            } else {
                GatewayError::backend(other.to_string())
            }
        }
    }
}

/// Translate an io error raised while streaming through an `object_store` writer
pub fn from_io_error(err: std::io::Error, bucket: &str, key: &str) -> GatewayError {
    if err.get_ref().is_some_and(|inner| inner.is::<object_store::Error>()) {
        if let Some(inner) = err.into_inner() {
            if let Ok(store_err) = inner.downcast::<object_store::Error>() {
                return from_object_store_error(*store_err, bucket, key);
            }
        }
        return GatewayError::backend(format!("Write to {}/{} failed", bucket, key));
    }

    if is_transport_failure(&err) {
        GatewayError::Unreachable {
            message: err.to_string(),
        }
    } else {
        GatewayError::backend(format!("Streaming {}/{} failed: {}", bucket, key, err))
    }
}

/// Translate an `aws-sdk-s3` failure for a bucket-level call
pub fn from_sdk_error<E>(err: SdkError<E, HttpResponse>, bucket: Option<&str>) -> GatewayError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            return GatewayError::Unreachable { message };
        }
        SdkError::ServiceError(ctx) if ctx.raw().status().as_u16() == 404 && err.code().is_none() => {
            // HEAD responses carry no body, so no error code either
            if let Some(bucket) = bucket {
                return GatewayError::bucket_not_found(bucket);
            }
        }
        _ => {}
    }

    match (err.code(), bucket) {
        (Some(NO_SUCH_BUCKET | NOT_FOUND), Some(bucket)) => GatewayError::bucket_not_found(bucket),
        (Some(BUCKET_ALREADY_EXISTS | BUCKET_ALREADY_OWNED_BY_YOU), Some(bucket)) => {
            GatewayError::BucketAlreadyExists {
                bucket: bucket.to_string(),
            }
        }
        (Some(INVALID_BUCKET_NAME), Some(bucket)) => GatewayError::InvalidName {
            name: bucket.to_string(),
            reason: err.message().unwrap_or("rejected by backend").to_string(),
        },
        (Some(NO_SUCH_KEY), Some(bucket)) => GatewayError::object_not_found(bucket, ""),
        _ => GatewayError::backend(message),
    }
}

/// Walk the source chain looking for a socket-level failure
fn is_transport_failure(err: &(dyn StdError + 'static)) -> bool {
    use std::io::ErrorKind;

    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::AddrNotAvailable
                    | ErrorKind::BrokenPipe
                    | ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        current = e.source();
    }

    // reqwest wraps connect failures without always exposing the io error
    err.to_string().contains("error sending request")
}
