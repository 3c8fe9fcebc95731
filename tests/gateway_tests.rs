use std::sync::Arc;
use std::time::Duration;

use storage_gateway::{
    BackendStatus, ConnectionSettings, ErrorKind, Gateway, GatewayError, GatewayMode,
    GatewayPolicy, MockPolicy, S3Connector, StatsAggregator,
    adapters::outbound::storage::mock::DEMO_BUCKETS, ports::BackendConnector,
};

async fn mock_gateway(policy: GatewayPolicy) -> Gateway {
    Gateway::builder()
        .policy(policy)
        .build()
        .await
        .unwrap()
}

fn forced_mock() -> GatewayPolicy {
    GatewayPolicy::builder().mock(MockPolicy::Forced).build()
}

/// Nothing listens on port 1, so every connection is refused immediately
fn unreachable_connector() -> Arc<dyn BackendConnector> {
    let settings = ConnectionSettings::builder()
        .endpoint("127.0.0.1:1")
        .access_key("minioadmin")
        .secret_key("minioadmin")
        .connect_timeout(Duration::from_secs(1))
        .build();
    Arc::new(S3Connector::new(settings))
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("photos").await.unwrap();

    let served = gateway
        .upload_object("photos", "2024/beach.jpg", &b"jpeg bytes"[..], Some(10))
        .await
        .unwrap();
    assert_eq!(served.mode, GatewayMode::Mock);
    assert_eq!(served.value.size, 10);
    assert!(!served.value.bucket_created);

    let download = gateway
        .download_object("photos", "2024/beach.jpg")
        .await
        .unwrap()
        .into_value();
    assert_eq!(download.size, 10);
    assert_eq!(&download.collect_bytes().await.unwrap()[..], b"jpeg bytes");
}

#[tokio::test]
async fn test_overwrite_replaces_content() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("docs").await.unwrap();

    gateway
        .upload_object("docs", "note.txt", &b"first"[..], None)
        .await
        .unwrap();
    gateway
        .upload_object("docs", "note.txt", &b"two"[..], None)
        .await
        .unwrap();

    let objects = gateway.list_objects("docs").await.unwrap().into_value();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].key, "note.txt");
    assert_eq!(objects[0].size, 3);

    let body = gateway
        .download_object("docs", "note.txt")
        .await
        .unwrap()
        .into_value()
        .collect_bytes()
        .await
        .unwrap();
    assert_eq!(&body[..], b"two");
}

#[tokio::test]
async fn test_declared_length_mismatch_rejected() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("docs").await.unwrap();

    let err = gateway
        .upload_object("docs", "short.txt", &b"abc"[..], Some(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let objects = gateway.list_objects("docs").await.unwrap().into_value();
    assert!(objects.is_empty());
}

#[tokio::test]
async fn test_deleted_object_is_gone() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("docs").await.unwrap();
    gateway
        .upload_object("docs", "tmp.txt", &b"x"[..], None)
        .await
        .unwrap();

    let deleted = gateway.delete_object("docs", "tmp.txt").await.unwrap();
    assert_eq!(deleted.value.as_str(), "tmp.txt");

    let err = gateway.download_object("docs", "tmp.txt").await.err().unwrap();
    assert!(matches!(err, GatewayError::ObjectNotFound { .. }));
}

#[tokio::test]
async fn test_deleted_bucket_cannot_be_listed() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("scratch").await.unwrap();
    gateway.delete_bucket("scratch").await.unwrap();

    let err = gateway.list_objects("scratch").await.unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));
    assert!(!gateway
        .list_buckets()
        .await
        .unwrap()
        .value
        .contains(&"scratch".to_string()));
}

#[tokio::test]
async fn test_non_empty_bucket_delete_fails() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("full").await.unwrap();
    gateway
        .upload_object("full", "a.txt", &b"a"[..], None)
        .await
        .unwrap();

    let err = gateway.delete_bucket("full").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendError);
    assert!(gateway.list_objects("full").await.is_ok());
}

#[tokio::test]
async fn test_strict_deletes_report_missing_targets() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("docs").await.unwrap();

    let err = gateway.delete_object("docs", "missing.txt").await.unwrap_err();
    assert!(matches!(err, GatewayError::ObjectNotFound { .. }));

    let err = gateway.delete_bucket("never-created").await.unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));
}

#[tokio::test]
async fn test_idempotent_deletes_succeed_for_missing_targets() {
    let policy = GatewayPolicy::builder()
        .mock(MockPolicy::Forced)
        .idempotent_deletes(true)
        .build();
    let gateway = mock_gateway(policy).await;
    gateway.create_bucket("docs").await.unwrap();

    assert!(gateway.delete_object("docs", "missing.txt").await.is_ok());
    assert!(gateway.delete_bucket("never-created").await.is_ok());

    // A missing bucket is still an error for object deletes
    let err = gateway.delete_object("never-created", "k").await.unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));
}

#[tokio::test]
async fn test_duplicate_bucket_policy() {
    let strict = mock_gateway(forced_mock()).await;
    strict.create_bucket("dup").await.unwrap();
    let err = strict.create_bucket("dup").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let lenient = mock_gateway(
        GatewayPolicy::builder()
            .mock(MockPolicy::Forced)
            .reject_duplicate_buckets(false)
            .build(),
    )
    .await;
    lenient.create_bucket("dup").await.unwrap();
    lenient.create_bucket("dup").await.unwrap();
    assert_eq!(lenient.list_buckets().await.unwrap().value, vec!["dup"]);
}

#[tokio::test]
async fn test_invalid_bucket_name_rejected() {
    let gateway = mock_gateway(forced_mock()).await;

    let err = gateway.create_bucket("Bad_Name").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidName);
    assert!(gateway.list_buckets().await.unwrap().value.is_empty());
}

#[tokio::test]
async fn test_upload_to_missing_bucket() {
    let strict = mock_gateway(forced_mock()).await;
    let err = strict
        .upload_object("nowhere", "a.txt", &b"a"[..], None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));

    let auto = mock_gateway(
        GatewayPolicy::builder()
            .mock(MockPolicy::Forced)
            .auto_create_bucket(true)
            .build(),
    )
    .await;
    let receipt = auto
        .upload_object("nowhere", "a.txt", &b"a"[..], None)
        .await
        .unwrap()
        .into_value();
    assert!(receipt.bucket_created);
    assert_eq!(auto.list_buckets().await.unwrap().value, vec!["nowhere"]);
}

#[tokio::test]
async fn test_concurrent_create_bucket_single_winner() {
    let gateway = Arc::new(mock_gateway(forced_mock()).await);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.create_bucket("contended").await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(GatewayError::BucketAlreadyExists { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_unreachable_endpoint_falls_back_to_mock() {
    let gateway = Gateway::builder()
        .connector(unreachable_connector())
        .policy(GatewayPolicy::builder().seed_demo_data(true).build())
        .build()
        .await
        .unwrap();

    let state = gateway.state().await;
    assert_eq!(state.mode(), GatewayMode::Mock);
    assert_eq!(state.status(), BackendStatus::Mock);
    assert!(state.last_error().is_some());
    assert_eq!(gateway.endpoint().as_deref(), Some("http://127.0.0.1:1"));

    // The failed live attempt leaves the demo data untouched
    let buckets = gateway.list_buckets().await.unwrap();
    assert_eq!(buckets.mode, GatewayMode::Mock);
    assert_eq!(buckets.value, DEMO_BUCKETS.to_vec());
}

#[tokio::test]
async fn test_unreachable_endpoint_without_fallback() {
    let gateway = Gateway::builder()
        .connector(unreachable_connector())
        .policy(GatewayPolicy::builder().mock(MockPolicy::Disabled).build())
        .build()
        .await
        .unwrap();

    assert_eq!(gateway.status().await, BackendStatus::Disconnected);
    let err = gateway.list_buckets().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    let health = gateway.health().await;
    assert!(!health.is_serving());
}

#[tokio::test]
async fn test_stats_over_empty_and_seeded_stores() {
    let empty = Arc::new(mock_gateway(forced_mock()).await);
    let stats = StatsAggregator::new(Arc::clone(&empty)).stats().await.unwrap();
    assert_eq!(stats.bucket_count, 0);
    assert_eq!(stats.object_count, 0);
    assert_eq!(stats.total_bytes, 0);
    assert_eq!(stats.mode, GatewayMode::Mock);

    let gateway = Arc::new(mock_gateway(forced_mock()).await);
    gateway.create_bucket("alpha").await.unwrap();
    gateway.create_bucket("bravo").await.unwrap();
    gateway.create_bucket("charlie").await.unwrap();
    gateway
        .upload_object("alpha", "one", &b"12345"[..], None)
        .await
        .unwrap();
    gateway
        .upload_object("charlie", "two", &b"123"[..], None)
        .await
        .unwrap();

    let stats = StatsAggregator::new(Arc::clone(&gateway))
        .with_page_size(2)
        .stats()
        .await
        .unwrap();
    assert_eq!(stats.bucket_count, 3);
    assert_eq!(stats.object_count, 2);
    assert_eq!(stats.total_bytes, 8);
}

#[tokio::test]
async fn test_stats_when_disconnected() {
    let gateway = Gateway::builder()
        .connector(unreachable_connector())
        .policy(GatewayPolicy::builder().mock(MockPolicy::Disabled).build())
        .build()
        .await
        .unwrap();

    let stats = StatsAggregator::new(Arc::new(gateway)).stats().await.unwrap();
    assert_eq!(stats.bucket_count, 0);
    assert_eq!(stats.status, BackendStatus::Disconnected);
}

#[tokio::test]
async fn test_presigned_url_in_mock_mode() {
    let gateway = mock_gateway(forced_mock()).await;
    gateway.create_bucket("docs").await.unwrap();

    let url = gateway
        .presigned_url("docs", "a/b.txt", 600)
        .await
        .unwrap()
        .into_value();
    assert!(url.starts_with("http://mock.local/docs/a/b.txt"));
    assert!(url.contains("600"));

    let err = gateway.presigned_url("docs", "a/b.txt", 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}
