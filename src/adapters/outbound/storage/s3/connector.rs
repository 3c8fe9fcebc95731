use async_trait::async_trait;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, retry::RetryConfig, timeout::TimeoutConfig,
};
use std::sync::Arc;

use super::{ConnectionSettings, S3Backend};
use crate::{
    domain::errors::GatewayResult,
    ports::storage::{BackendConnector, StorageBackend},
};

const MAX_ATTEMPTS: u32 = 2;

/// Opens connections to an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Connector {
    settings: ConnectionSettings,
}

impl S3Connector {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    async fn sdk_client(&self) -> aws_sdk_s3::Client {
        let settings = &self.settings;
        let region = Region::new(settings.region.clone());

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(settings.connect_timeout)
            .build();

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(region.clone())
            .endpoint_url(settings.endpoint_url())
            .force_path_style(true)
            .timeout_config(timeouts)
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));

        if let Some((access_key, secret_key)) = settings.static_credentials() {
            let credentials = Credentials::new(access_key, secret_key, None, None, "static");
            builder = builder.credentials_provider(credentials);
        } else {
            // Environment, profile and instance credentials
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            if let Some(provider) = sdk_config.credentials_provider() {
                builder = builder.credentials_provider(provider);
            }
        }

        aws_sdk_s3::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl BackendConnector for S3Connector {
    fn endpoint(&self) -> String {
        self.settings.endpoint_url()
    }

    async fn connect(&self) -> GatewayResult<Arc<dyn StorageBackend>> {
        tracing::debug!(endpoint = %self.endpoint(), region = %self.settings.region, "Connecting to storage backend");

        let client = self.sdk_client().await;
        let backend = S3Backend::new(client, self.settings.clone());
        backend.ping().await?;

        tracing::info!(endpoint = %self.endpoint(), "Connected to storage backend");
        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_to_closed_port_is_unreachable() {
        let connector = S3Connector::new(
            ConnectionSettings::builder()
                .endpoint("127.0.0.1:1")
                .access_key("minioadmin")
                .secret_key("minioadmin")
                .connect_timeout(Duration::from_secs(1))
                .build(),
        );

        let err = connector.connect().await.err().unwrap();
        assert!(err.is_connection_failure(), "{err:?}");
    }
}
