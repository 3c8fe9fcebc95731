use serde::{Deserialize, Serialize};

use super::{BackendStatus, GatewayMode};

/// Aggregate usage across every bucket visible to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub bucket_count: u64,
    pub object_count: u64,
    pub total_bytes: u64,
    pub mode: GatewayMode,
    pub status: BackendStatus,
}

impl StorageStats {
    pub fn empty(mode: GatewayMode, status: BackendStatus) -> Self {
        Self {
            bucket_count: 0,
            object_count: 0,
            total_bytes: 0,
            mode,
            status,
        }
    }
}
