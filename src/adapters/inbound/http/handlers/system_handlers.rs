use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::HashMap;

use crate::{
    adapters::inbound::http::{
        dto::{ApiResult, HealthResponseDto, api_error},
        router::AppState,
    },
    domain::models::{BackendStatus, GatewayMode, StorageStats},
};

pub const SERVICE_NAME: &str = "storage-gateway";

/// Service index
pub async fn service_index(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "S3-compatible storage gateway",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "mode": app_state.gateway.mode().await,
        "endpoints": {
            "health": "/health",
            "health_detailed": "/api/v1/health",
            "buckets": "/api/v1/buckets",
            "stats": "/api/v1/stats",
        }
    }))
}

/// Liveness of the service itself; never touches the backend
pub async fn basic_health(State(app_state): State<AppState>) -> Json<Value> {
    let state = app_state.gateway.state().await;
    let endpoint = match state.mode() {
        GatewayMode::Live => app_state.gateway.endpoint(),
        GatewayMode::Mock => None,
    };

    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "mode": state.mode(),
        "endpoint": endpoint.unwrap_or_else(|| "N/A".to_string()),
    }))
}

/// Probe the backend and report per-component health
pub async fn detailed_health(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<HealthResponseDto>) {
    let health = app_state.gateway.health().await;

    let (status_code, status) = match health.status {
        BackendStatus::Healthy => (StatusCode::OK, "healthy"),
        BackendStatus::Mock => (StatusCode::OK, "degraded"),
        BackendStatus::Disconnected => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("storage".to_string(), health.status.as_str().to_string());

    (
        status_code,
        Json(HealthResponseDto {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            mode: health.mode,
            components,
            endpoint: health.endpoint,
            last_error: health.last_error,
            reconnect_backoff_secs: app_state.gateway.policy().reconnect_backoff.as_secs(),
            timestamp: Utc::now(),
        }),
    )
}

/// Aggregate usage statistics
pub async fn storage_stats(State(app_state): State<AppState>) -> ApiResult<Json<StorageStats>> {
    match app_state.stats.stats().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err(api_error(e, app_state.gateway.mode().await)),
    }
}
