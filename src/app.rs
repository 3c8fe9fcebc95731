use std::sync::Arc;
use std::time::Duration;

use crate::{
    adapters::outbound::storage::{ConnectionSettings, S3Connector},
    ports::storage::BackendConnector,
    services::{
        DEFAULT_PAGE_SIZE, DEFAULT_RECONNECT_BACKOFF, Gateway, GatewayPolicy, MockPolicy,
        StatsAggregator,
    },
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Live backend; `None` means mock only
    pub connection: Option<ConnectionSettings>,
    pub policy: GatewayPolicy,
    pub stats_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: None,
            policy: GatewayPolicy::default(),
            stats_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Read the same variables the server binary accepts
    pub fn from_env() -> Result<Self, AppError> {
        let connection = match env_string("S3_ENDPOINT") {
            Some(endpoint) => Some(
                ConnectionSettings::builder()
                    .endpoint(endpoint)
                    .maybe_access_key(env_string("S3_ACCESS_KEY"))
                    .maybe_secret_key(env_string("S3_SECRET_KEY"))
                    .region(env_string("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()))
                    .use_tls(env_flag("S3_USE_TLS", false)?)
                    .connect_timeout(env_secs("CONNECT_TIMEOUT_SECS", 5)?)
                    .build(),
            ),
            None => None,
        };

        let policy = GatewayPolicy::builder()
            .mock(MockPolicy::from_flags(
                env_flag("MOCK_MODE", false)?,
                env_flag("MOCK_FALLBACK", true)?,
            ))
            .reject_duplicate_buckets(env_flag("REJECT_DUPLICATE_BUCKETS", true)?)
            .idempotent_deletes(env_flag("IDEMPOTENT_DELETES", false)?)
            .auto_create_bucket(env_flag("AUTO_CREATE_BUCKET", false)?)
            .seed_demo_data(env_flag("SEED_DEMO_DATA", true)?)
            .reconnect_backoff(env_secs(
                "RECONNECT_BACKOFF_SECS",
                DEFAULT_RECONNECT_BACKOFF.as_secs(),
            )?)
            .build();

        let stats_page_size = match env_string("STATS_PAGE_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| AppError::Configuration {
                    message: format!("STATS_PAGE_SIZE must be a positive integer, got '{}'", value),
                })?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            connection,
            policy,
            stats_page_size,
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Boolean grammar shared by environment variables and command-line flags
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!(
            "expected true/false, yes/no, on/off or 1/0, got '{}'",
            other
        )),
    }
}

/// Parse the boolean setting `name`
pub fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    parse_bool(value).map_err(|reason| AppError::Configuration {
        message: format!("{}: {}", name, reason),
    })
}

fn env_flag(name: &str, default: bool) -> Result<bool, AppError> {
    match env_string(name) {
        Some(value) => parse_flag(name, &value),
        None => Ok(default),
    }
}

fn env_secs(name: &str, default: u64) -> Result<Duration, AppError> {
    let secs = match env_string(name) {
        Some(value) => value.parse::<u64>().map_err(|_| AppError::Configuration {
            message: format!("{} must be a whole number of seconds, got '{}'", name, value),
        })?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    pub gateway: Arc<Gateway>,
    pub stats: Arc<StatsAggregator>,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    connector: Option<Arc<dyn BackendConnector>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            connector: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the live backend
    pub fn with_connection(mut self, settings: ConnectionSettings) -> Self {
        self.config.connection = Some(settings);
        self
    }

    /// Use a custom connector instead of one built from the connection settings
    pub fn with_connector(mut self, connector: Arc<dyn BackendConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_policy(mut self, policy: GatewayPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn with_stats_page_size(mut self, page_size: usize) -> Self {
        self.config.stats_page_size = page_size;
        self
    }

    /// Build the gateway and the services around it
    pub async fn build(self) -> Result<AppServices, AppError> {
        let connector = match (self.connector, self.config.connection) {
            (Some(connector), _) => Some(connector),
            (None, Some(settings)) => {
                Some(Arc::new(S3Connector::new(settings)) as Arc<dyn BackendConnector>)
            }
            (None, None) => None,
        };

        let gateway = Gateway::builder()
            .maybe_connector(connector)
            .policy(self.config.policy)
            .build()
            .await
            .map_err(|e| AppError::StorageInit {
                message: e.to_string(),
            })?;
        let gateway = Arc::new(gateway);

        let stats = StatsAggregator::new(Arc::clone(&gateway))
            .with_page_size(self.config.stats_page_size);

        Ok(AppServices {
            gateway,
            stats: Arc::new(stats),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },
}

/// Convenience functions for common configurations
///
/// Create a mock-only application for testing and development
pub async fn create_in_memory_app(seed_demo_data: bool) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_policy(
            GatewayPolicy::builder()
                .mock(MockPolicy::Forced)
                .seed_demo_data(seed_demo_data)
                .build(),
        )
        .build()
        .await
}

/// Create an application backed by an S3-compatible endpoint
pub async fn create_s3_app(
    settings: ConnectionSettings,
    policy: GatewayPolicy,
) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_connection(settings)
        .with_policy(policy)
        .build()
        .await
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(AppConfig::from_env()?)
        .build()
        .await
}
