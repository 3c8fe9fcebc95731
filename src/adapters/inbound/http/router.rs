use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::GatewayModeLayer;
use super::handlers::{
    basic_health,
    // Bucket handlers
    create_bucket,
    delete_bucket,
    // Object handlers
    delete_object,
    // System handlers
    detailed_health,
    get_object,
    list_buckets,
    list_objects,
    presigned_url,
    put_object,
    service_index,
    storage_stats,
    upload_object_form,
};
use crate::{
    app::AppServices,
    services::{Gateway, StatsAggregator},
};

/// Largest body accepted on upload routes (S3's single PUT limit)
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Upload body limit for this target, capped at what `usize` can hold
pub fn upload_body_limit() -> usize {
    usize::try_from(MAX_UPLOAD_BYTES).unwrap_or(usize::MAX)
}

/// Application state containing all services
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub stats: Arc<StatsAggregator>,
}

impl From<AppServices> for AppState {
    fn from(services: AppServices) -> Self {
        Self {
            gateway: services.gateway,
            stats: services.stats,
        }
    }
}

/// Create the main application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_index))
        .route("/health", get(basic_health))
        .nest("/api/v1", create_api_router())
        .layer(GatewayModeLayer::new(state.gateway.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Add state for dependency injection
        .with_state(state)
}

/// Create a router with just the versioned API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(detailed_health))
        .route("/stats", get(storage_stats))
        // Bucket operations
        .route("/buckets", get(list_buckets).post(create_bucket))
        .route("/buckets/{bucket}", delete(delete_bucket))
        // Object operations
        .route(
            "/buckets/{bucket}/objects",
            get(list_objects).post(upload_object_form),
        )
        .route(
            "/buckets/{bucket}/objects/{*key}",
            get(get_object).put(put_object).delete(delete_object),
        )
        .route("/buckets/{bucket}/presigned-url", get(presigned_url))
        .layer(DefaultBodyLimit::max(upload_body_limit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::create_in_memory_app;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_router_serves_index() {
        let services = create_in_memory_app(false).await.unwrap();
        let server = TestServer::new(create_router(services.into())).unwrap();

        let response = server.get("/").await;
        response.assert_status_ok();
        assert_eq!(response.header("x-gateway-mode"), "mock");
        let body: serde_json::Value = response.json();
        assert_eq!(body["mode"], "mock");
    }

    #[test]
    fn test_upload_limit_fits_target() {
        let limit = upload_body_limit() as u64;
        assert!(limit <= MAX_UPLOAD_BYTES);
        if usize::BITS >= 64 {
            assert_eq!(limit, MAX_UPLOAD_BYTES);
        }
    }

    #[tokio::test]
    async fn test_api_router_mounts_standalone() {
        let services = create_in_memory_app(true).await.unwrap();
        let router = create_api_router().with_state(AppState::from(services));
        let server = TestServer::new(router).unwrap();

        let response = server.get("/buckets").await;
        response.assert_status_ok();
    }
}
