//! HTTP client for the gateway API
//!
//! Mirrors the REST surface one method per route. Non-2xx responses are
//! decoded into [`ClientError::Api`] using the server's error body.

use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::{
    adapters::inbound::http::dto::{
        BucketListResponseDto, BucketResponseDto, DeleteObjectResponseDto, ErrorResponseDto,
        HealthResponseDto, ListObjectsResponseDto, PresignedUrlResponseDto, UploadResponseDto,
    },
    domain::models::StorageStats,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const API_PREFIX: &str = "/api/v1";

/// Errors returned by [`GatewayClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for a running gateway server
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Base URL from `GATEWAY_URL`, falling back to localhost
    pub fn from_env() -> Self {
        let base_url = std::env::var("GATEWAY_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn bucket_path(bucket: &str) -> String {
        format!("/buckets/{}", urlencoding::encode(bucket))
    }

    fn object_path(bucket: &str, key: &str) -> String {
        let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
        format!("{}/objects/{}", Self::bucket_path(bucket), encoded.join("/"))
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (kind, message) = match serde_json::from_str::<ErrorResponseDto>(&body) {
            Ok(err) => (Some(err.error), err.message),
            Err(_) if body.is_empty() => (None, status.to_string()),
            Err(_) => (None, body),
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            kind,
            message,
        })
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    pub async fn list_buckets(&self) -> ClientResult<BucketListResponseDto> {
        let response = self.http.get(self.api_url("/buckets")).send().await?;
        Self::json(response).await
    }

    pub async fn create_bucket(&self, bucket: &str) -> ClientResult<BucketResponseDto> {
        let response = self
            .http
            .post(self.api_url("/buckets"))
            .json(&serde_json::json!({ "bucket_name": bucket }))
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn delete_bucket(&self, bucket: &str) -> ClientResult<BucketResponseDto> {
        let response = self
            .http
            .delete(self.api_url(&Self::bucket_path(bucket)))
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn list_objects(&self, bucket: &str) -> ClientResult<ListObjectsResponseDto> {
        let url = self.api_url(&format!("{}/objects", Self::bucket_path(bucket)));
        let response = self.http.get(url).send().await?;
        Self::json(response).await
    }

    /// Upload a local file as a multipart form, streaming it from disk.
    /// The key defaults to the file name.
    pub async fn upload_file(
        &self,
        bucket: &str,
        path: &Path,
        key: Option<&str>,
    ) -> ClientResult<UploadResponseDto> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::InvalidArgument(format!("{} has no file name", path.display())))?
            .to_string();

        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let mut form = Form::new();
        if let Some(key) = key {
            form = form.text("key", key.to_string());
        }
        form = form.part("file", Part::stream_with_length(body, length).file_name(file_name));

        let url = self.api_url(&format!("{}/objects", Self::bucket_path(bucket)));
        let response = self.http.post(url).multipart(form).send().await?;
        Self::json(response).await
    }

    /// Upload an in-memory payload to an explicit key
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
    ) -> ClientResult<UploadResponseDto> {
        let response = self
            .http
            .put(self.api_url(&Self::object_path(bucket, key)))
            .body(data.into())
            .send()
            .await?;
        Self::json(response).await
    }

    /// Stream an object to `dest`, returning the number of bytes written
    pub async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> ClientResult<u64> {
        let response = self
            .http
            .get(self.api_url(&Self::object_path(bucket, key)))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Fetch a whole object into memory
    pub async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Bytes> {
        let response = self
            .http
            .get(self.api_url(&Self::object_path(bucket, key)))
            .send()
            .await?;
        Ok(Self::check(response).await?.bytes().await?)
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<DeleteObjectResponseDto> {
        let response = self
            .http
            .delete(self.api_url(&Self::object_path(bucket, key)))
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Option<u64>,
    ) -> ClientResult<PresignedUrlResponseDto> {
        let url = self.api_url(&format!("{}/presigned-url", Self::bucket_path(bucket)));
        let mut query = vec![("key", key.to_string())];
        if let Some(secs) = expires_in {
            query.push(("expires_in", secs.to_string()));
        }

        let response = self.http.get(url).query(&query).send().await?;
        Self::json(response).await
    }

    pub async fn stats(&self) -> ClientResult<StorageStats> {
        let response = self.http.get(self.api_url("/stats")).send().await?;
        Self::json(response).await
    }

    /// Detailed health. A 503 still carries a health body, so it is decoded too.
    pub async fn health(&self) -> ClientResult<HealthResponseDto> {
        let response = self.http.get(self.api_url("/health")).send().await?;
        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Ok(response.json().await?);
        }
        Self::json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_encodes_each_segment() {
        assert_eq!(
            GatewayClient::object_path("docs", "reports/q1 summary#2.txt"),
            "/buckets/docs/objects/reports/q1%20summary%232.txt"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("http://localhost:3000/");
        assert_eq!(client.api_url("/stats"), "http://localhost:3000/api/v1/stats");
    }
}
