use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, time::Duration};
use storage_gateway::{
    adapters::inbound::http::router::{AppState, create_router},
    adapters::outbound::storage::ConnectionSettings,
    app::{AppBuilder, AppConfig, parse_bool},
    services::{DEFAULT_PAGE_SIZE, GatewayPolicy, MockPolicy},
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "storage-gateway")]
#[command(about = "S3-compatible storage gateway with mock fallback", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// S3-compatible endpoint (host:port or URL). Without it the gateway runs on the mock store.
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    s3_secret_key: Option<String>,

    /// Use TLS for the backend connection
    #[arg(long, env = "S3_USE_TLS", default_value = "false", action = clap::ArgAction::Set, value_parser = parse_bool)]
    s3_use_tls: bool,

    /// Connect timeout for the backend, in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "5")]
    connect_timeout_secs: u64,

    /// Always serve from the mock store
    #[arg(long, env = "MOCK_MODE", default_value = "false", action = clap::ArgAction::Set, value_parser = parse_bool)]
    mock_mode: bool,

    /// Fall back to the mock store when the backend is unreachable
    #[arg(long, env = "MOCK_FALLBACK", default_value = "true", action = clap::ArgAction::Set, value_parser = parse_bool)]
    mock_fallback: bool,

    /// Reject creating a bucket that already exists
    #[arg(long, env = "REJECT_DUPLICATE_BUCKETS", default_value = "true", action = clap::ArgAction::Set, value_parser = parse_bool)]
    reject_duplicate_buckets: bool,

    /// Treat deleting a missing object as success
    #[arg(long, env = "IDEMPOTENT_DELETES", default_value = "false", action = clap::ArgAction::Set, value_parser = parse_bool)]
    idempotent_deletes: bool,

    /// Create the target bucket on upload when it is missing
    #[arg(long, env = "AUTO_CREATE_BUCKET", default_value = "false", action = clap::ArgAction::Set, value_parser = parse_bool)]
    auto_create_bucket: bool,

    /// Seed the mock store with demo buckets
    #[arg(long, env = "SEED_DEMO_DATA", default_value = "true", action = clap::ArgAction::Set, value_parser = parse_bool)]
    seed_demo_data: bool,

    /// Minimum seconds between reconnect attempts
    #[arg(long, env = "RECONNECT_BACKOFF_SECS", default_value = "5")]
    reconnect_backoff_secs: u64,

    /// Buckets per stats page
    #[arg(long, env = "STATS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    stats_page_size: usize,

    /// Log level, or a full tracing filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        if self.stats_page_size == 0 {
            anyhow::bail!("STATS_PAGE_SIZE must be at least 1");
        }

        let connection = self.s3_endpoint.as_ref().map(|endpoint| {
            ConnectionSettings::builder()
                .endpoint(endpoint.clone())
                .maybe_access_key(self.s3_access_key.clone())
                .maybe_secret_key(self.s3_secret_key.clone())
                .region(self.s3_region.clone())
                .use_tls(self.s3_use_tls)
                .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
                .build()
        });

        let policy = GatewayPolicy::builder()
            .mock(MockPolicy::from_flags(self.mock_mode, self.mock_fallback))
            .reject_duplicate_buckets(self.reject_duplicate_buckets)
            .idempotent_deletes(self.idempotent_deletes)
            .auto_create_bucket(self.auto_create_bucket)
            .seed_demo_data(self.seed_demo_data)
            .reconnect_backoff(Duration::from_secs(self.reconnect_backoff_secs))
            .build();

        Ok(AppConfig {
            connection,
            policy,
            stats_page_size: self.stats_page_size,
        })
    }

    fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("Invalid LOG_LEVEL '{}'", self.log_level))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!("Starting storage gateway");
    info!(
        endpoint = cli.s3_endpoint.as_deref().unwrap_or("none"),
        mock_mode = cli.mock_mode,
        mock_fallback = cli.mock_fallback,
        "Backend configuration"
    );

    let config = cli.to_app_config()?;
    let services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    info!(
        mode = services.gateway.mode().await.as_str(),
        status = services.gateway.status().await.as_str(),
        "Gateway ready"
    );

    let router = create_router(AppState::from(services));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cli.host, cli.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .context("Failed to start server")?;

    Ok(())
}
