use futures::TryStreamExt;
use std::sync::Arc;

use crate::{
    domain::{
        errors::{GatewayError, GatewayResult},
        models::{BackendStatus, StorageStats},
    },
    services::{BucketPage, Gateway},
};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Position in the bucket walk. A finished cursor yields no more pages.
///
/// Besides the last bucket visited, the cursor remembers where that bucket
/// sat in the listing, so the walk survives the bucket being deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsCursor {
    start_after: Option<String>,
    index: usize,
    finished: bool,
}

impl StatsCursor {
    pub fn start() -> Self {
        Self::default()
    }

    /// Resume after `bucket`. If it no longer exists the walk restarts from
    /// the first bucket.
    pub fn after(bucket: impl Into<String>) -> Self {
        Self {
            start_after: Some(bucket.into()),
            index: 0,
            finished: false,
        }
    }

    pub fn start_after(&self) -> Option<&str> {
        self.start_after.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn marker(&self) -> Option<(&str, usize)> {
        self.start_after.as_deref().map(|name| (name, self.index))
    }

    fn advance(&mut self, page: &BucketPage, page_size: usize) {
        match page.names.last() {
            Some(last) if page.names.len() >= page_size => {
                self.start_after = Some(last.clone());
                self.index = page.offset + page.names.len() - 1;
            }
            _ => self.finished = true,
        }
    }
}

/// Partial totals for one page of buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTotals {
    pub buckets: u64,
    pub objects: u64,
    pub bytes: u64,
}

/// Computes usage totals by walking every bucket's listing.
///
/// Buckets are fetched a page at a time and each bucket's objects are
/// folded as a stream, but a full walk still touches every object once.
#[derive(Clone)]
pub struct StatsAggregator {
    gateway: Arc<Gateway>,
    page_size: usize,
}

impl StatsAggregator {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Totals for the page of buckets at `cursor`, advancing it
    pub async fn next_page(&self, cursor: &mut StatsCursor) -> GatewayResult<PageTotals> {
        if cursor.is_finished() {
            return Ok(PageTotals::default());
        }

        let page = self
            .gateway
            .list_buckets_page(cursor.marker(), self.page_size)
            .await?
            .into_value();

        let mut totals = PageTotals {
            buckets: page.names.len() as u64,
            ..Default::default()
        };

        for bucket in &page.names {
            let listing = match self.gateway.object_listing(bucket).await {
                Ok(served) => served.into_value(),
                // Deleted between the bucket listing and now
                Err(GatewayError::BucketNotFound { .. }) => {
                    totals.buckets -= 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let (objects, bytes) = listing
                .try_fold((0u64, 0u64), |(count, size), object| async move {
                    Ok::<_, GatewayError>((count + 1, size + object.size))
                })
                .await?;

            tracing::debug!(bucket = %bucket, objects, bytes, "Bucket walked");
            totals.objects += objects;
            totals.bytes += bytes;
        }

        cursor.advance(&page, self.page_size);
        Ok(totals)
    }

    /// Walk all buckets and report totals plus the status seen at call time
    pub async fn stats(&self) -> GatewayResult<StorageStats> {
        let state = self.gateway.state().await;
        let mut stats = StorageStats::empty(state.mode(), state.status());

        let mut cursor = StatsCursor::start();
        while !cursor.is_finished() {
            let page = match self.next_page(&mut cursor).await {
                Ok(page) => page,
                Err(GatewayError::NotConnected { .. }) => {
                    let state = self.gateway.state().await;
                    return Ok(StorageStats::empty(state.mode(), BackendStatus::Disconnected));
                }
                Err(e) => return Err(e),
            };

            stats.bucket_count += page.buckets;
            stats.object_count += page.objects;
            stats.total_bytes += page.bytes;
        }

        // A reconnect during the walk may have changed the picture
        let state = self.gateway.state().await;
        stats.mode = state.mode();
        stats.status = state.status();

        tracing::debug!(
            buckets = stats.bucket_count,
            objects = stats.object_count,
            bytes = stats.total_bytes,
            mode = %stats.mode,
            "Storage stats computed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::GatewayPolicy;

    #[tokio::test]
    async fn test_empty_store_has_zero_totals() {
        let gateway = Arc::new(Gateway::builder().build().await.unwrap());
        let stats = StatsAggregator::new(gateway).stats().await.unwrap();

        assert_eq!(stats.bucket_count, 0);
        assert_eq!(stats.object_count, 0);
        assert_eq!(stats.total_bytes, 0);
        assert_eq!(stats.status, BackendStatus::Mock);
    }

    #[tokio::test]
    async fn test_walk_crosses_page_boundaries() {
        let gateway = Arc::new(Gateway::builder().build().await.unwrap());
        for i in 0..5 {
            let bucket = format!("bucket-{i}");
            gateway.create_bucket(&bucket).await.unwrap();
            gateway
                .upload_object(&bucket, "data.bin", &b"0123456789"[..], Some(10))
                .await
                .unwrap();
        }

        let aggregator = StatsAggregator::new(gateway).with_page_size(2);
        let stats = aggregator.stats().await.unwrap();

        assert_eq!(stats.bucket_count, 5);
        assert_eq!(stats.object_count, 5);
        assert_eq!(stats.total_bytes, 50);
    }

    #[tokio::test]
    async fn test_cursor_resumes_after_bucket() {
        let gateway = Arc::new(
            Gateway::builder()
                .policy(GatewayPolicy::builder().seed_demo_data(true).build())
                .build()
                .await
                .unwrap(),
        );
        let aggregator = StatsAggregator::new(gateway).with_page_size(1);

        let mut cursor = StatsCursor::after("demo-bucket");
        let page = aggregator.next_page(&mut cursor).await.unwrap();
        assert_eq!(page.buckets, 1);
        assert_eq!(page.objects, 0);
        assert_eq!(cursor.start_after(), Some("test-bucket"));

        let page = aggregator.next_page(&mut cursor).await.unwrap();
        assert_eq!(page, PageTotals::default());
        assert!(cursor.is_finished());
    }

    #[tokio::test]
    async fn test_walk_survives_cursor_bucket_deletion() {
        let gateway = Arc::new(Gateway::builder().build().await.unwrap());
        for name in ["aaa", "bbb", "ccc"] {
            gateway.create_bucket(name).await.unwrap();
        }
        let aggregator = StatsAggregator::new(Arc::clone(&gateway)).with_page_size(1);

        let mut cursor = StatsCursor::start();
        let mut buckets = aggregator.next_page(&mut cursor).await.unwrap().buckets;
        assert_eq!(cursor.start_after(), Some("aaa"));

        gateway.delete_bucket("aaa").await.unwrap();

        while !cursor.is_finished() {
            buckets += aggregator.next_page(&mut cursor).await.unwrap().buckets;
        }
        assert_eq!(buckets, 3);
    }
}
