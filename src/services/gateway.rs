use futures::stream::BoxStream;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tokio::sync::{Mutex, RwLock};

use crate::{
    adapters::outbound::storage::{BucketObjects, MockStore},
    domain::{
        errors::{GatewayError, GatewayResult},
        models::{
            BackendStatus, GatewayMode, ObjectDownload, ObjectSummary, Served, UploadReceipt,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BackendConnector, StorageBackend},
};

pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);
/// Longest presigned URL lifetime S3 accepts (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// How the in-memory store is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MockPolicy {
    /// Always serve from the mock store, never dial the backend
    Forced,
    /// Serve from the mock store while the backend is missing or unreachable
    #[default]
    Fallback,
    /// No mock store; operations fail with `NotConnected` instead
    Disabled,
}

impl MockPolicy {
    pub fn from_flags(mock_mode: bool, mock_fallback: bool) -> Self {
        match (mock_mode, mock_fallback) {
            (true, _) => MockPolicy::Forced,
            (false, true) => MockPolicy::Fallback,
            (false, false) => MockPolicy::Disabled,
        }
    }
}

/// Behavioural switches applied identically in live and mock mode
#[derive(Debug, Clone, bon::Builder)]
pub struct GatewayPolicy {
    #[builder(default)]
    pub mock: MockPolicy,
    /// `createBucket` on an existing name fails instead of succeeding as a no-op
    #[builder(default = true)]
    pub reject_duplicate_buckets: bool,
    /// Deleting a missing bucket or object succeeds instead of failing with `NotFound`
    #[builder(default)]
    pub idempotent_deletes: bool,
    /// Uploading into a missing bucket creates it first
    #[builder(default)]
    pub auto_create_bucket: bool,
    /// Start the mock store with the demo buckets and objects
    #[builder(default)]
    pub seed_demo_data: bool,
    /// Minimum gap between lazy reconnect attempts
    #[builder(default = DEFAULT_RECONNECT_BACKOFF)]
    pub reconnect_backoff: Duration,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// One page of the bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketPage {
    /// Position of the first name within the full listing
    pub offset: usize,
    pub names: Vec<String>,
}

/// The gateway's connection state: which mode it is in and the handle serving it
#[derive(Clone)]
pub struct GatewayState {
    mode: GatewayMode,
    handle: Option<Arc<dyn StorageBackend>>,
    healthy: bool,
    last_error: Option<String>,
}

impl GatewayState {
    fn live(handle: Arc<dyn StorageBackend>) -> Self {
        Self {
            mode: GatewayMode::Live,
            handle: Some(handle),
            healthy: true,
            last_error: None,
        }
    }

    fn mock(handle: Arc<dyn StorageBackend>, reason: Option<String>) -> Self {
        Self {
            mode: GatewayMode::Mock,
            handle: Some(handle),
            healthy: true,
            last_error: reason,
        }
    }

    fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            mode: GatewayMode::Live,
            handle: None,
            healthy: false,
            last_error: Some(reason.into()),
        }
    }

    pub fn mode(&self) -> GatewayMode {
        self.mode
    }

    pub fn status(&self) -> BackendStatus {
        match (self.mode, self.handle.is_some() && self.healthy) {
            (GatewayMode::Mock, _) => BackendStatus::Mock,
            (GatewayMode::Live, true) => BackendStatus::Healthy,
            (GatewayMode::Live, false) => BackendStatus::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn handle(&self) -> GatewayResult<Arc<dyn StorageBackend>> {
        self.handle.clone().ok_or_else(|| GatewayError::NotConnected {
            message: self
                .last_error
                .clone()
                .unwrap_or_else(|| "no storage backend available".to_string()),
        })
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("mode", &self.mode)
            .field("connected", &self.handle.is_some())
            .field("healthy", &self.healthy)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Point-in-time health report
#[derive(Debug, Clone, Serialize)]
pub struct GatewayHealth {
    pub mode: GatewayMode,
    pub status: BackendStatus,
    pub mock_policy: MockPolicy,
    pub endpoint: Option<String>,
    pub last_error: Option<String>,
}

impl GatewayHealth {
    /// Whether the gateway can serve requests at all
    pub fn is_serving(&self) -> bool {
        self.status != BackendStatus::Disconnected
    }
}

/// Single entry point for bucket and object operations.
///
/// Every call runs against whichever backend the current [`GatewayState`]
/// holds: the live backend from the connector, or the in-memory store.
/// Before an operation the gateway retries the live backend if it is absent
/// or unhealthy, at most once per `reconnect_backoff`. Calls arriving while
/// a reconnect is in flight run against the state it is replacing.
pub struct Gateway {
    connector: Option<Arc<dyn BackendConnector>>,
    mock: MockStore,
    policy: GatewayPolicy,
    state: RwLock<GatewayState>,
    // Serializes reconnects and remembers when the last one finished
    reconnecting: Mutex<Option<Instant>>,
}

#[bon::bon]
impl Gateway {
    /// Build a gateway and run the first connection attempt
    #[builder]
    pub async fn new(
        connector: Option<Arc<dyn BackendConnector>>,
        #[builder(default)] policy: GatewayPolicy,
    ) -> GatewayResult<Self> {
        let mock = if policy.seed_demo_data {
            MockStore::seeded().await?
        } else {
            MockStore::new()
        };

        let gateway = Self {
            connector,
            mock,
            policy,
            state: RwLock::new(GatewayState::disconnected("not connected yet")),
            reconnecting: Mutex::new(None),
        };

        let state = gateway.reconnect().await;
        tracing::info!(
            mode = %state.mode(),
            status = state.status().as_str(),
            mock_policy = ?gateway.policy.mock,
            "Storage gateway initialized"
        );

        Ok(gateway)
    }
}

impl Gateway {
    pub fn policy(&self) -> &GatewayPolicy {
        &self.policy
    }

    /// Configured live endpoint, if any
    pub fn endpoint(&self) -> Option<String> {
        self.connector.as_ref().map(|c| c.endpoint())
    }

    /// The in-memory store backing mock mode
    pub fn mock_store(&self) -> &MockStore {
        &self.mock
    }

    /// Current state, without attempting a reconnect
    pub async fn state(&self) -> GatewayState {
        self.state.read().await.clone()
    }

    pub async fn mode(&self) -> GatewayMode {
        self.state.read().await.mode()
    }

    pub async fn status(&self) -> BackendStatus {
        self.state.read().await.status()
    }

    /// Attempt to (re)establish the live connection and swap in the resulting
    /// state. Not throttled.
    pub async fn reconnect(&self) -> GatewayState {
        let mut last_attempt = self.reconnecting.lock().await;
        self.transition(&mut last_attempt).await
    }

    async fn transition(&self, last_attempt: &mut Option<Instant>) -> GatewayState {
        let previous = self.state.read().await.clone();
        let next = self.next_state(&previous).await;

        // Backoff counts from the end of the attempt
        *last_attempt = Some(Instant::now());

        if previous.mode() != next.mode() || previous.status() != next.status() {
            tracing::info!(
                from_mode = %previous.mode(),
                to_mode = %next.mode(),
                status = next.status().as_str(),
                reason = next.last_error().unwrap_or(""),
                "Gateway mode changed"
            );
        }

        *self.state.write().await = next.clone();
        next
    }

    async fn next_state(&self, current: &GatewayState) -> GatewayState {
        if self.policy.mock == MockPolicy::Forced {
            return GatewayState::mock(self.mock_handle(), None);
        }

        let Some(connector) = &self.connector else {
            return self.fallback("no storage endpoint configured");
        };

        if let (GatewayMode::Live, Some(handle)) = (current.mode(), &current.handle) {
            if connector.probe(handle.as_ref()).await {
                return GatewayState::live(Arc::clone(handle));
            }
        }

        tracing::debug!(endpoint = %connector.endpoint(), "Attempting backend connection");
        match connector.connect().await {
            Ok(handle) => GatewayState::live(handle),
            Err(e) => {
                tracing::warn!(endpoint = %connector.endpoint(), error = %e, "Backend connection failed");
                self.fallback(e.to_string())
            }
        }
    }

    fn fallback(&self, reason: impl Into<String>) -> GatewayState {
        match self.policy.mock {
            MockPolicy::Disabled => GatewayState::disconnected(reason),
            MockPolicy::Forced | MockPolicy::Fallback => {
                GatewayState::mock(self.mock_handle(), Some(reason.into()))
            }
        }
    }

    fn mock_handle(&self) -> Arc<dyn StorageBackend> {
        Arc::new(self.mock.clone())
    }

    fn wants_reconnect(&self, state: &GatewayState) -> bool {
        self.connector.is_some()
            && self.policy.mock != MockPolicy::Forced
            && (state.mode() != GatewayMode::Live || !state.healthy)
    }

    /// State to run the next operation against, reconnecting first if due
    async fn current_state(&self) -> GatewayState {
        let state = self.state.read().await.clone();
        if !self.wants_reconnect(&state) {
            return state;
        }

        // A reconnect is already in flight; serve the current state
        let Ok(mut last_attempt) = self.reconnecting.try_lock() else {
            return state;
        };

        // Another request may have reconnected since the first read
        let state = self.state.read().await.clone();
        if !self.wants_reconnect(&state) {
            return state;
        }

        if let Some(at) = *last_attempt {
            if at.elapsed() < self.policy.reconnect_backoff {
                return state;
            }
        }

        self.transition(&mut last_attempt).await
    }

    async fn mark_unhealthy(&self, handle: &Arc<dyn StorageBackend>, err: &GatewayError) {
        let mut state = self.state.write().await;
        let same_handle = state
            .handle
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, handle));

        if same_handle && state.healthy {
            tracing::warn!(error = %err, "Backend marked unhealthy");
            state.healthy = false;
            state.last_error = Some(err.to_string());
        }
    }

    /// Run `op` against the current backend and tag the result with its mode
    async fn run<T, F, Fut>(&self, operation: &'static str, op: F) -> GatewayResult<Served<T>>
    where
        F: FnOnce(Arc<dyn StorageBackend>) -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let handle = self.current_state().await.handle()?;
        let mode = handle.mode();

        match op(Arc::clone(&handle)).await {
            Ok(value) => Ok(Served::new(mode, value)),
            Err(e) => {
                if e.is_connection_failure() {
                    self.mark_unhealthy(&handle, &e).await;
                }
                tracing::debug!(operation, mode = %mode, kind = %e.kind(), error = %e, "Gateway operation failed");
                Err(e)
            }
        }
    }

    async fn require_bucket(backend: &dyn StorageBackend, bucket: &BucketName) -> GatewayResult<()> {
        if backend.bucket_exists(bucket).await? {
            Ok(())
        } else {
            Err(GatewayError::bucket_not_found(bucket.as_str()))
        }
    }

    async fn objects(backend: &dyn StorageBackend, bucket: &BucketName) -> GatewayResult<BucketObjects> {
        let store = backend.bucket_store(bucket).await?;
        Ok(BucketObjects::new(bucket.clone(), store))
    }

    pub async fn list_buckets(&self) -> GatewayResult<Served<Vec<String>>> {
        self.run("list_buckets", |backend| async move { backend.list_buckets().await })
            .await
    }

    /// One page of the bucket listing: up to `limit` names after `start_after`.
    ///
    /// `start_after` carries the bucket name and the index it held when last
    /// seen. If that bucket has since been deleted, its successors have moved
    /// up by one, so the page resumes at the remembered index.
    pub async fn list_buckets_page(
        &self,
        start_after: Option<(&str, usize)>,
        limit: usize,
    ) -> GatewayResult<Served<BucketPage>> {
        self.run("list_buckets", |backend| async move {
            let names = backend.list_buckets().await?;
            let offset = match start_after {
                Some((after, index)) => names
                    .iter()
                    .position(|n| n == after)
                    .map(|i| i + 1)
                    .unwrap_or_else(|| index.min(names.len())),
                None => 0,
            };
            Ok(BucketPage {
                offset,
                names: names.into_iter().skip(offset).take(limit).collect(),
            })
        })
        .await
    }

    pub async fn create_bucket(&self, name: &str) -> GatewayResult<Served<BucketName>> {
        let bucket = BucketName::new(name)?;
        let reject_duplicates = self.policy.reject_duplicate_buckets;

        self.run("create_bucket", |backend| async move {
            match backend.create_bucket(&bucket).await {
                Ok(()) => {
                    tracing::info!(bucket = %bucket, mode = %backend.mode(), "Bucket created");
                    Ok(bucket)
                }
                Err(GatewayError::BucketAlreadyExists { .. }) if !reject_duplicates => Ok(bucket),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn delete_bucket(&self, name: &str) -> GatewayResult<Served<BucketName>> {
        let bucket = BucketName::new(name)?;
        let idempotent = self.policy.idempotent_deletes;

        self.run("delete_bucket", |backend| async move {
            match backend.delete_bucket(&bucket).await {
                Ok(()) => {
                    tracing::info!(bucket = %bucket, mode = %backend.mode(), "Bucket deleted");
                    Ok(bucket)
                }
                Err(GatewayError::BucketNotFound { .. }) if idempotent => Ok(bucket),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn list_objects(&self, bucket: &str) -> GatewayResult<Served<Vec<ObjectSummary>>> {
        let bucket = BucketName::new(bucket)?;

        self.run("list_objects", |backend| async move {
            Self::require_bucket(backend.as_ref(), &bucket).await?;
            Self::objects(backend.as_ref(), &bucket).await?.list_all().await
        })
        .await
    }

    /// Lazy listing of one bucket, for callers that fold over large buckets
    pub async fn object_listing(
        &self,
        bucket: &str,
    ) -> GatewayResult<Served<BoxStream<'static, GatewayResult<ObjectSummary>>>> {
        let bucket = BucketName::new(bucket)?;

        self.run("list_objects", |backend| async move {
            Self::require_bucket(backend.as_ref(), &bucket).await?;
            Ok(Self::objects(backend.as_ref(), &bucket).await?.list())
        })
        .await
    }

    /// Stream `reader` into `bucket/key`. `length`, when known, is checked
    /// against the bytes actually received.
    pub async fn upload_object<R>(
        &self,
        bucket: &str,
        key: &str,
        reader: R,
        length: Option<u64>,
    ) -> GatewayResult<Served<UploadReceipt>>
    where
        R: AsyncRead + Unpin + Send,
    {
        let bucket = BucketName::new(bucket)?;
        let key = ObjectKey::new(key)?;
        let auto_create = self.policy.auto_create_bucket;

        self.run("upload_object", |backend| async move {
            let mut bucket_created = false;
            if !backend.bucket_exists(&bucket).await? {
                if !auto_create {
                    return Err(GatewayError::bucket_not_found(bucket.as_str()));
                }
                match backend.create_bucket(&bucket).await {
                    Ok(()) => {
                        tracing::info!(bucket = %bucket, "Bucket created for upload");
                        bucket_created = true;
                    }
                    Err(GatewayError::BucketAlreadyExists { .. }) => {}
                    Err(e) => return Err(e),
                }
            }

            let size = Self::objects(backend.as_ref(), &bucket)
                .await?
                .put_stream(&key, reader, length)
                .await?;

            tracing::info!(bucket = %bucket, key = %key, size, mode = %backend.mode(), "Object uploaded");
            Ok(UploadReceipt {
                bucket: bucket.to_string(),
                key: key.to_string(),
                size,
                bucket_created,
            })
        })
        .await
    }

    pub async fn download_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> GatewayResult<Served<ObjectDownload>> {
        let bucket = BucketName::new(bucket)?;
        let key = ObjectKey::new(key)?;

        self.run("download_object", |backend| async move {
            Self::require_bucket(backend.as_ref(), &bucket).await?;
            Self::objects(backend.as_ref(), &bucket)
                .await?
                .get_stream(&key)
                .await
        })
        .await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> GatewayResult<Served<ObjectKey>> {
        let bucket = BucketName::new(bucket)?;
        let key = ObjectKey::new(key)?;
        let idempotent = self.policy.idempotent_deletes;

        self.run("delete_object", |backend| async move {
            Self::require_bucket(backend.as_ref(), &bucket).await?;
            let objects = Self::objects(backend.as_ref(), &bucket).await?;

            // S3 deletes succeed for missing keys, so look first
            if !objects.exists(&key).await? {
                if idempotent {
                    return Ok(key);
                }
                return Err(GatewayError::object_not_found(bucket.as_str(), key.as_str()));
            }

            objects.delete(&key).await?;
            tracing::info!(bucket = %bucket, key = %key, mode = %backend.mode(), "Object deleted");
            Ok(key)
        })
        .await
    }

    pub async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in_secs: u64,
    ) -> GatewayResult<Served<String>> {
        let bucket = BucketName::new(bucket)?;
        let key = ObjectKey::new(key)?;

        if !(1..=MAX_PRESIGN_EXPIRY_SECS).contains(&expires_in_secs) {
            return Err(GatewayError::invalid_parameter(format!(
                "expires_in must be between 1 and {} seconds, got {}",
                MAX_PRESIGN_EXPIRY_SECS, expires_in_secs
            )));
        }

        self.run("presigned_url", |backend| async move {
            backend
                .presign_get(&bucket, &key, Duration::from_secs(expires_in_secs))
                .await
        })
        .await
    }

    /// Probe the backend and report. Reconnects first when due.
    pub async fn health(&self) -> GatewayHealth {
        let state = self.current_state().await;

        if let (GatewayMode::Live, Some(handle), Some(connector)) =
            (state.mode(), &state.handle, &self.connector)
        {
            if !connector.probe(handle.as_ref()).await {
                let err = GatewayError::Unreachable {
                    message: "health probe failed".to_string(),
                };
                self.mark_unhealthy(handle, &err).await;
            }
        }

        let state = self.state().await;
        GatewayHealth {
            mode: state.mode(),
            status: state.status(),
            mock_policy: self.policy.mock,
            endpoint: self.endpoint(),
            last_error: state.last_error,
        }
    }
}
