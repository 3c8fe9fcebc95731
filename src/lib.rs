pub mod adapters;
pub mod app;
pub mod client;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core entities, value objects and errors
pub use domain::{
    BackendStatus,
    // Value objects
    BucketName,
    // Errors
    ErrorKind,
    GatewayError,
    // Models
    GatewayMode,
    GatewayResult,
    ObjectDownload,
    ObjectKey,
    ObjectSummary,
    Served,
    StorageStats,
    UploadReceipt,
    ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{BackendConnector, StorageBackend};

// Service implementations - gateway logic
pub use services::{
    BucketPage, Gateway, GatewayHealth, GatewayPolicy, GatewayState, MockPolicy, StatsAggregator,
    StatsCursor,
};

// Application factory and configuration
pub use app::{
    AppBuilder, AppConfig, AppError, AppServices, create_app_from_env, create_in_memory_app,
    create_s3_app,
};

// Adapter types - infrastructure implementations
pub use adapters::inbound::http::router::{AppState, create_router};
pub use adapters::outbound::storage::{
    BucketObjects, ConnectionSettings, MockStore, S3Backend, S3Connector,
};

pub use client::{ClientError, GatewayClient};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AppBuilder, AppServices, AppState, BucketName, ConnectionSettings, Gateway, GatewayClient,
        GatewayError, GatewayMode, GatewayPolicy, MockPolicy, MockStore, ObjectKey, S3Connector,
        StatsAggregator, StorageBackend, create_in_memory_app, create_router, create_s3_app,
    };
}
