use serde::{Deserialize, Serialize};

/// Which backend served a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    Live,
    Mock,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayMode::Live => "live",
            GatewayMode::Mock => "mock",
        }
    }
}

impl std::fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection health as observed at call time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Live backend answered the last call or probe
    Healthy,
    /// Serving from the in-memory store
    Mock,
    /// Live backend expected but not reachable
    Disconnected,
}

impl BackendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Healthy => "healthy",
            BackendStatus::Mock => "mock",
            BackendStatus::Disconnected => "disconnected",
        }
    }
}

/// A successful gateway result tagged with the mode that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub mode: GatewayMode,
    pub value: T,
}

impl<T> Served<T> {
    pub fn new(mode: GatewayMode, value: T) -> Self {
        Self { mode, value }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Served<U> {
        Served {
            mode: self.mode,
            value: f(self.value),
        }
    }
}
