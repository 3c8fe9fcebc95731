use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore as ObjectStoreBackend, PutPayload, memory::InMemory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::{
    adapters::outbound::storage::{BucketObjects, error::from_object_store_error},
    domain::{
        errors::{GatewayError, GatewayResult},
        models::{GatewayMode, ObjectSummary},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::StorageBackend,
};

/// Host used in placeholder presigned URLs
pub const MOCK_URL_BASE: &str = "http://mock.local";

/// Buckets created by [`MockStore::seeded`]
pub const DEMO_BUCKETS: [&str; 2] = ["demo-bucket", "test-bucket"];
/// Objects seeded into the first demo bucket
pub const DEMO_OBJECTS: [(&str, &[u8]); 2] = [
    ("sample-file-1.txt", b"Sample text file served by the mock storage backend.\n"),
    ("sample-file-2.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9]),
];

/// In-memory stand-in for a live backend.
///
/// Each bucket owns its own `InMemory` object store. The bucket table is
/// guarded by a single coarse lock and keeps insertion order.
#[derive(Clone, Default)]
pub struct MockStore {
    buckets: Arc<RwLock<Vec<(String, Arc<InMemory>)>>>,
}

impl MockStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the fixed demo buckets and objects
    pub async fn seeded() -> GatewayResult<Self> {
        let store = Self::new();

        for name in DEMO_BUCKETS {
            store.create_bucket(&BucketName::new(name)?).await?;
        }

        let demo = BucketName::new(DEMO_BUCKETS[0])?;
        for (key, content) in DEMO_OBJECTS {
            store
                .put_object(&demo, &ObjectKey::new(key)?, Bytes::from_static(content))
                .await?;
        }

        tracing::debug!(buckets = DEMO_BUCKETS.len(), "Seeded mock store");
        Ok(store)
    }

    async fn lookup(&self, bucket: &str) -> Option<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, store)| Arc::clone(store))
    }

    /// Listing that never fails: unknown buckets list as empty
    pub async fn list_objects(&self, bucket: &BucketName) -> Vec<ObjectSummary> {
        let Some(store) = self.lookup(bucket.as_str()).await else {
            return Vec::new();
        };

        match BucketObjects::new(bucket.clone(), store).list_all().await {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(bucket = %bucket, error = %e, "Mock listing failed");
                Vec::new()
            }
        }
    }

    /// Store `data` under `key`, replacing any previous content
    pub async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
    ) -> GatewayResult<()> {
        let store = self
            .lookup(bucket.as_str())
            .await
            .ok_or_else(|| GatewayError::bucket_not_found(bucket.as_str()))?;

        store
            .put(key.path(), PutPayload::from(data))
            .await
            .map_err(|e| from_object_store_error(e, bucket.as_str(), key.as_str()))?;
        Ok(())
    }

    /// Remove `key`. Returns whether it existed.
    pub async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> GatewayResult<bool> {
        let Some(store) = self.lookup(bucket.as_str()).await else {
            return Ok(false);
        };

        let objects = BucketObjects::new(bucket.clone(), store);
        if !objects.exists(key).await? {
            return Ok(false);
        }
        objects.delete(key).await?;
        Ok(true)
    }
}

#[async_trait]
impl StorageBackend for MockStore {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Mock
    }

    async fn ping(&self) -> GatewayResult<()> {
        Ok(())
    }

    async fn list_buckets(&self) -> GatewayResult<Vec<String>> {
        Ok(self
            .buckets
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> GatewayResult<bool> {
        Ok(self.lookup(bucket.as_str()).await.is_some())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;

        if buckets.iter().any(|(name, _)| name == bucket.as_str()) {
            return Err(GatewayError::BucketAlreadyExists {
                bucket: bucket.to_string(),
            });
        }

        buckets.push((bucket.to_string(), Arc::new(InMemory::new())));
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;

        let position = buckets
            .iter()
            .position(|(name, _)| name == bucket.as_str())
            .ok_or_else(|| GatewayError::bucket_not_found(bucket.as_str()))?;

        // Same rule S3 applies: only empty buckets can go
        let store: Arc<dyn ObjectStoreBackend> = buckets[position].1.clone();
        let is_empty = BucketObjects::new(bucket.clone(), store)
            .list_all()
            .await?
            .is_empty();
        if !is_empty {
            return Err(GatewayError::backend(format!(
                "BucketNotEmpty: bucket {} still holds objects",
                bucket
            )));
        }

        buckets.remove(position);
        Ok(())
    }

    async fn bucket_store(&self, bucket: &BucketName) -> GatewayResult<Arc<dyn ObjectStoreBackend>> {
        let store = self
            .lookup(bucket.as_str())
            .await
            .ok_or_else(|| GatewayError::bucket_not_found(bucket.as_str()))?;
        Ok(store as Arc<dyn ObjectStoreBackend>)
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> GatewayResult<String> {
        let path = key
            .as_str()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!(
            "{}/{}/{}?X-Amz-Expires={}",
            MOCK_URL_BASE,
            bucket,
            path,
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_buckets_keep_insertion_order() {
        let store = MockStore::new();
        for name in ["zeta", "alpha", "mid-bucket"] {
            store.create_bucket(&bucket(name)).await.unwrap();
        }

        assert_eq!(
            store.list_buckets().await.unwrap(),
            vec!["zeta", "alpha", "mid-bucket"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_bucket_rejected() {
        let store = MockStore::new();
        store.create_bucket(&bucket("dup")).await.unwrap();

        let err = store.create_bucket(&bucket("dup")).await.unwrap_err();
        assert!(matches!(err, GatewayError::BucketAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_unknown_bucket_lists_empty() {
        let store = MockStore::new();
        assert!(store.list_objects(&bucket("nowhere")).await.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_contents() {
        let store = MockStore::seeded().await.unwrap();

        assert_eq!(store.list_buckets().await.unwrap(), DEMO_BUCKETS.to_vec());

        let keys: Vec<String> = store
            .list_objects(&bucket("demo-bucket"))
            .await
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["sample-file-1.txt", "sample-file-2.jpg"]);
        assert!(store.list_objects(&bucket("test-bucket")).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_object_reports_presence() {
        let store = MockStore::new();
        let b = bucket("objs");
        let key = ObjectKey::new("a.txt").unwrap();
        store.create_bucket(&b).await.unwrap();
        store
            .put_object(&b, &key, Bytes::from_static(b"abc"))
            .await
            .unwrap();

        assert!(store.delete_object(&b, &key).await.unwrap());
        assert!(!store.delete_object(&b, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_empty_bucket_cannot_be_deleted() {
        let store = MockStore::new();
        let b = bucket("full");
        store.create_bucket(&b).await.unwrap();
        store
            .put_object(&b, &ObjectKey::new("x").unwrap(), Bytes::from_static(b"1"))
            .await
            .unwrap();

        let err = store.delete_bucket(&b).await.unwrap_err();
        assert!(matches!(err, GatewayError::Backend { .. }));
        assert!(store.bucket_exists(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_presign_placeholder() {
        let store = MockStore::new();
        let url = store
            .presign_get(
                &bucket("demo-bucket"),
                &ObjectKey::new("dir/file.txt").unwrap(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(url, "http://mock.local/demo-bucket/dir/file.txt?X-Amz-Expires=60");
    }

    #[tokio::test]
    async fn test_presign_placeholder_encodes_key() {
        let store = MockStore::new();
        let url = store
            .presign_get(
                &bucket("notes-bucket"),
                &ObjectKey::new("notes/#1 {draft}.md").unwrap(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(
            url,
            "http://mock.local/notes-bucket/notes/%231%20%7Bdraft%7D.md?X-Amz-Expires=60"
        );
    }
}
