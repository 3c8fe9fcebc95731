//! Live S3-compatible backend
//!
//! Bucket administration uses `aws-sdk-s3`; object traffic and presigning use
//! one `object_store` `AmazonS3` store per bucket.

mod connector;
mod s3_backend;

pub use connector::S3Connector;
pub use s3_backend::S3Backend;

use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to reach the live backend
#[derive(Clone, bon::Builder)]
pub struct ConnectionSettings {
    /// `host[:port]`; an `http://` or `https://` prefix is tolerated and ignored
    #[builder(into)]
    pub endpoint: String,
    #[builder(into)]
    pub access_key: Option<String>,
    #[builder(into)]
    pub secret_key: Option<String>,
    #[builder(into, default = DEFAULT_REGION.to_string())]
    pub region: String,
    #[builder(default)]
    pub use_tls: bool,
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    /// The endpoint with any scheme prefix removed
    pub fn host(&self) -> &str {
        strip_scheme(&self.endpoint)
    }

    /// Full URL, with the scheme chosen by `use_tls`
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}", scheme, self.host())
    }

    /// Static credentials, when both halves are present
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty() => Some((ak, sk)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("use_tls", &self.use_tls)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Remove a leading `http://` or `https://`, plus any trailing slash
pub fn strip_scheme(endpoint: &str) -> &str {
    let trimmed = endpoint.trim();
    let without = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without.trim_end_matches('/')
}
