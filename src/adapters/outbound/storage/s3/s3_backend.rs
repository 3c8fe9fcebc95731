use async_trait::async_trait;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use object_store::{
    ClientOptions, ObjectStore as ObjectStoreBackend, RetryConfig,
    aws::{AmazonS3, AmazonS3Builder},
    signer::Signer,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{ConnectionSettings, DEFAULT_REGION};
use crate::{
    adapters::outbound::storage::error::{from_object_store_error, from_sdk_error},
    domain::{
        errors::{GatewayError, GatewayResult},
        models::GatewayMode,
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::StorageBackend,
};

/// Handle to a live S3-compatible backend
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    settings: ConnectionSettings,
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Backend {
    pub fn new(client: aws_sdk_s3::Client, settings: ConnectionSettings) -> Self {
        Self {
            client,
            settings,
            stores: RwLock::new(HashMap::new()),
        }
    }

    fn build_store(&self, bucket: &BucketName) -> GatewayResult<AmazonS3> {
        let settings = &self.settings;

        let mut builder = match settings.static_credentials() {
            Some((access_key, secret_key)) => AmazonS3Builder::new()
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key),
            None => AmazonS3Builder::from_env(),
        };

        builder = builder
            .with_endpoint(settings.endpoint_url())
            .with_bucket_name(bucket.as_str())
            .with_region(&settings.region)
            .with_allow_http(!settings.use_tls)
            .with_virtual_hosted_style_request(false)
            .with_client_options(ClientOptions::new().with_connect_timeout(settings.connect_timeout))
            .with_retry(RetryConfig {
                max_retries: 1,
                ..Default::default()
            });

        builder
            .build()
            .map_err(|e| from_object_store_error(e, bucket.as_str(), ""))
    }

    async fn store_for(&self, bucket: &BucketName) -> GatewayResult<Arc<AmazonS3>> {
        if let Some(store) = self.stores.read().await.get(bucket.as_str()) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket.as_str()) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(self.build_store(bucket)?);
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Live
    }

    async fn ping(&self) -> GatewayResult<()> {
        self.client
            .list_buckets()
            .max_buckets(1)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| from_sdk_error(e, None))
    }

    async fn list_buckets(&self) -> GatewayResult<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_buckets()
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| from_sdk_error(e, None))?;

            names.extend(
                output
                    .buckets()
                    .iter()
                    .filter_map(|b| b.name().map(str::to_string)),
            );

            match output.continuation_token() {
                Some(token) if !token.is_empty() => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> GatewayResult<bool> {
        match self.client.head_bucket().bucket(bucket.as_str()).send().await {
            Ok(_) => Ok(true),
            Err(e) => match from_sdk_error(e, Some(bucket.as_str())) {
                GatewayError::BucketNotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn create_bucket(&self, bucket: &BucketName) -> GatewayResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket.as_str());

        if self.settings.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.settings.region.as_str(),
                    ))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| from_sdk_error(e, Some(bucket.as_str())))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> GatewayResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(e, Some(bucket.as_str())))?;

        self.stores.write().await.remove(bucket.as_str());
        Ok(())
    }

    async fn bucket_store(&self, bucket: &BucketName) -> GatewayResult<Arc<dyn ObjectStoreBackend>> {
        let store = self.store_for(bucket).await?;
        Ok(store as Arc<dyn ObjectStoreBackend>)
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> GatewayResult<String> {
        let store = self.store_for(bucket).await?;

        let url = store
            .signed_url(http::Method::GET, key.path(), expires_in)
            .await
            .map_err(|e| from_object_store_error(e, bucket.as_str(), key.as_str()))?;
        Ok(url.to_string())
    }
}
