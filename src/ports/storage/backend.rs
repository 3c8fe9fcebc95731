use async_trait::async_trait;
use object_store::ObjectStore as ObjectStoreBackend;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    errors::GatewayResult,
    models::GatewayMode,
    value_objects::{BucketName, ObjectKey},
};

/// Port for a bucket/object storage backend.
///
/// Bucket administration lives on the trait itself; object operations go
/// through the per-bucket [`ObjectStoreBackend`] returned by
/// [`StorageBackend::bucket_store`], so every backend shares one object
/// code path.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Which gateway mode this backend represents
    fn mode(&self) -> GatewayMode;

    /// Cheap liveness check. Transport failures come back as errors.
    async fn ping(&self) -> GatewayResult<()>;

    /// Names of all buckets, in backend order
    async fn list_buckets(&self) -> GatewayResult<Vec<String>>;

    async fn bucket_exists(&self, bucket: &BucketName) -> GatewayResult<bool>;

    /// Create a bucket. Fails with `BucketAlreadyExists` when the name is taken.
    async fn create_bucket(&self, bucket: &BucketName) -> GatewayResult<()>;

    /// Delete a bucket. Fails with `BucketNotFound` when absent.
    async fn delete_bucket(&self, bucket: &BucketName) -> GatewayResult<()>;

    /// Object store scoped to one bucket. Does not check that the bucket exists.
    async fn bucket_store(&self, bucket: &BucketName) -> GatewayResult<Arc<dyn ObjectStoreBackend>>;

    /// Time-limited GET URL for an object
    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> GatewayResult<String>;
}
