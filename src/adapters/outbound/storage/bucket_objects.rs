use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use object_store::{ObjectMeta, ObjectStore as ObjectStoreBackend, buffered::BufWriter};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::{
    adapters::outbound::storage::error::{from_io_error, from_object_store_error},
    domain::{
        errors::{GatewayError, GatewayResult},
        models::{ObjectDownload, ObjectSummary},
        value_objects::{BucketName, ObjectKey},
    },
};

/// Object operations for a single bucket over any `object_store` backend.
///
/// Live mode hands in an `AmazonS3` store, mock mode an `InMemory` one; the
/// code below does not care which.
#[derive(Clone)]
pub struct BucketObjects {
    bucket: BucketName,
    inner: Arc<dyn ObjectStoreBackend>,
}

impl BucketObjects {
    pub fn new(bucket: BucketName, store: Arc<dyn ObjectStoreBackend>) -> Self {
        Self {
            bucket,
            inner: store,
        }
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    fn summary(meta: ObjectMeta) -> ObjectSummary {
        ObjectSummary {
            key: meta.location.to_string(),
            size: meta.size,
            last_modified: Some(meta.last_modified),
            etag: meta.e_tag,
        }
    }

    /// Lazily list every object in the bucket
    pub fn list(&self) -> BoxStream<'static, GatewayResult<ObjectSummary>> {
        let bucket = self.bucket.as_str().to_string();

        self.inner
            .list(None)
            .map_ok(Self::summary)
            .map_err(move |e| match e {
                object_store::Error::NotFound { .. } => GatewayError::bucket_not_found(&bucket),
                other => from_object_store_error(other, &bucket, ""),
            })
            .boxed()
    }

    /// Collect the full listing
    pub async fn list_all(&self) -> GatewayResult<Vec<ObjectSummary>> {
        self.list().try_collect().await
    }

    /// Stream `reader` into `key`, replacing any existing object.
    ///
    /// When `expected_len` is given and the stream ends short of it (or runs
    /// past it) the upload is aborted and nothing is committed.
    pub async fn put_stream<R>(
        &self,
        key: &ObjectKey,
        mut reader: R,
        expected_len: Option<u64>,
    ) -> GatewayResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let bucket = self.bucket.as_str();
        let mut writer = BufWriter::new(Arc::clone(&self.inner), key.path().clone());

        let written = match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(n) => n,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(bucket, key = %key, error = %abort_err, "Failed to abort upload");
                }
                return Err(from_io_error(e, bucket, key.as_str()));
            }
        };

        if let Some(expected) = expected_len {
            if expected != written {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(bucket, key = %key, error = %abort_err, "Failed to abort upload");
                }
                return Err(GatewayError::invalid_parameter(format!(
                    "Declared length {} does not match {} bytes received",
                    expected, written
                )));
            }
        }

        writer
            .shutdown()
            .await
            .map_err(|e| from_io_error(e, bucket, key.as_str()))?;

        tracing::debug!(bucket, key = %key, bytes = written, "Object written");
        Ok(written)
    }

    /// Open a streaming read of `key`
    pub async fn get_stream(&self, key: &ObjectKey) -> GatewayResult<ObjectDownload> {
        let bucket = self.bucket.as_str().to_string();
        let key_str = key.as_str().to_string();

        let result = self
            .inner
            .get(key.path())
            .await
            .map_err(|e| from_object_store_error(e, &bucket, &key_str))?;

        let meta = result.meta.clone();
        let stream = {
            let bucket = bucket.clone();
            let key_str = key_str.clone();
            result
                .into_stream()
                .map_err(move |e| from_object_store_error(e, &bucket, &key_str))
                .boxed()
        };

        Ok(ObjectDownload {
            bucket,
            key: key_str,
            size: meta.size,
            last_modified: Some(meta.last_modified),
            etag: meta.e_tag,
            stream,
        })
    }

    pub async fn head(&self, key: &ObjectKey) -> GatewayResult<ObjectSummary> {
        self.inner
            .head(key.path())
            .await
            .map(Self::summary)
            .map_err(|e| from_object_store_error(e, self.bucket.as_str(), key.as_str()))
    }

    pub async fn exists(&self, key: &ObjectKey) -> GatewayResult<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(GatewayError::ObjectNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete `key`. Whether a missing key is an error depends on the store.
    pub async fn delete(&self, key: &ObjectKey) -> GatewayResult<()> {
        self.inner
            .delete(key.path())
            .await
            .map_err(|e| from_object_store_error(e, self.bucket.as_str(), key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn objects() -> BucketObjects {
        BucketObjects::new(
            BucketName::new("unit-bucket").unwrap(),
            Arc::new(InMemory::new()),
        )
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let objects = objects();
        let key = ObjectKey::new("docs/readme.txt").unwrap();

        let written = objects
            .put_stream(&key, &b"hello world"[..], Some(11))
            .await
            .unwrap();
        assert_eq!(written, 11);

        let download = objects.get_stream(&key).await.unwrap();
        assert_eq!(download.size, 11);
        assert_eq!(download.key, "docs/readme.txt");
        assert_eq!(&download.collect_bytes().await.unwrap()[..], b"hello world");
    }

    #[tokio::test]
    async fn test_length_mismatch_commits_nothing() {
        let objects = objects();
        let key = ObjectKey::new("short.bin").unwrap();

        let err = objects
            .put_stream(&key, &b"abc"[..], Some(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParameter { .. }));
        assert!(!objects.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_reports_keys_verbatim() {
        let objects = objects();
        let key = ObjectKey::new("notes/#1 {draft}.md").unwrap();
        objects.put_stream(&key, &b"x"[..], None).await.unwrap();

        let listed = objects.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "notes/#1 {draft}.md");
        assert_eq!(listed[0].size, 1);
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let objects = objects();
        let key = ObjectKey::new("missing.txt").unwrap();

        let err = objects.get_stream(&key).await.unwrap_err();
        assert!(matches!(err, GatewayError::ObjectNotFound { .. }));
    }
}
