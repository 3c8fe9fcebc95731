use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::domain::errors::GatewayResult;

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// Single-pass byte stream of an object's content
pub type ObjectByteStream = BoxStream<'static, GatewayResult<Bytes>>;

/// A download in progress. The body is lazy: nothing beyond the first
/// response chunk is fetched until the stream is polled.
pub struct ObjectDownload {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub stream: ObjectByteStream,
}

impl ObjectDownload {
    /// Drain the stream into memory. Intended for small objects and tests.
    pub async fn collect_bytes(self) -> GatewayResult<Bytes> {
        use futures::TryStreamExt;

        let chunks: Vec<Bytes> = self.stream.try_collect().await?;
        Ok(chunks.concat().into())
    }
}

impl std::fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("size", &self.size)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub bucket_created: bool,
}
