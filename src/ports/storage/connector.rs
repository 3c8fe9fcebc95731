use async_trait::async_trait;
use std::sync::Arc;

use crate::{domain::errors::GatewayResult, ports::storage::StorageBackend};

/// Port for establishing connections to a live backend
#[async_trait]
pub trait BackendConnector: Send + Sync + 'static {
    /// Human-readable target, for logs and health output
    fn endpoint(&self) -> String;

    /// Build a handle and verify it answers. Never caches anything itself.
    async fn connect(&self) -> GatewayResult<Arc<dyn StorageBackend>>;

    /// Liveness of an existing handle. Errors are swallowed into `false`.
    async fn probe(&self, handle: &dyn StorageBackend) -> bool {
        match handle.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint(), error = %e, "Backend probe failed");
                false
            }
        }
    }
}
