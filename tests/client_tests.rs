use std::net::SocketAddr;

use bytes::Bytes;
use storage_gateway::{
    ClientError, GatewayClient,
    adapters::inbound::http::router::{AppState, create_router},
    create_in_memory_app,
    domain::models::GatewayMode,
};
use tokio::net::TcpListener;

/// Serve a seeded mock gateway on an ephemeral port
async fn spawn_gateway() -> SocketAddr {
    let services = create_in_memory_app(true).await.unwrap();
    let router = create_router(AppState::from(services));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

async fn client() -> GatewayClient {
    let addr = spawn_gateway().await;
    GatewayClient::new(format!("http://{}", addr))
}

#[tokio::test]
async fn test_client_bucket_lifecycle() {
    let client = client().await;

    let buckets = client.list_buckets().await.unwrap();
    assert_eq!(buckets.buckets, vec!["demo-bucket", "test-bucket"]);

    let created = client.create_bucket("client-bucket").await.unwrap();
    assert!(created.success);
    assert_eq!(created.mode, GatewayMode::Mock);

    let err = client.create_bucket("client-bucket").await.unwrap_err();
    match err {
        ClientError::Api { status, kind, .. } => {
            assert_eq!(status, 409);
            assert_eq!(kind.as_deref(), Some("already_exists"));
        }
        other => panic!("unexpected error: {other}"),
    }

    client.delete_bucket("client-bucket").await.unwrap();
    let buckets = client.list_buckets().await.unwrap();
    assert_eq!(buckets.count, 2);
}

#[tokio::test]
async fn test_client_file_round_trip() {
    let client = client().await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("report.txt");
    tokio::fs::write(&source, b"quarterly numbers").await.unwrap();

    let receipt = client
        .upload_file("demo-bucket", &source, Some("reports/q1 report.txt"))
        .await
        .unwrap();
    assert_eq!(receipt.key, "reports/q1 report.txt");
    assert_eq!(receipt.size, 17);

    let listing = client.list_objects("demo-bucket").await.unwrap();
    assert!(listing.objects.iter().any(|o| o.key == "reports/q1 report.txt"));

    let dest = dir.path().join("downloaded.txt");
    let written = client
        .download_to("demo-bucket", "reports/q1 report.txt", &dest)
        .await
        .unwrap();
    assert_eq!(written, 17);
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"quarterly numbers");

    client
        .delete_object("demo-bucket", "reports/q1 report.txt")
        .await
        .unwrap();
    let err = client
        .get_object("demo-bucket", "reports/q1 report.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_client_upload_defaults_key_to_file_name() {
    let client = client().await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("photo.jpg");
    tokio::fs::write(&source, [0xFFu8, 0xD8, 0xFF]).await.unwrap();

    let receipt = client.upload_file("test-bucket", &source, None).await.unwrap();
    assert_eq!(receipt.key, "photo.jpg");
    assert_eq!(receipt.size, 3);
}

#[tokio::test]
async fn test_client_put_and_get_bytes() {
    let client = client().await;

    client
        .put_object("test-bucket", "blob.bin", Bytes::from_static(b"\x00\x01\x02"))
        .await
        .unwrap();

    let body = client.get_object("test-bucket", "blob.bin").await.unwrap();
    assert_eq!(&body[..], b"\x00\x01\x02");
}

#[tokio::test]
async fn test_chunked_upload_without_content_length() {
    let addr = spawn_gateway().await;

    let chunks = futures::stream::iter(
        ["first ", "second ", "third"].map(|part| Ok::<_, std::io::Error>(Bytes::from(part))),
    );

    let response = reqwest::Client::new()
        .put(format!(
            "http://{}/api/v1/buckets/test-bucket/objects/streamed.txt",
            addr
        ))
        .body(reqwest::Body::wrap_stream(chunks))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let client = GatewayClient::new(format!("http://{}", addr));
    let body = client.get_object("test-bucket", "streamed.txt").await.unwrap();
    assert_eq!(&body[..], b"first second third");
}

#[tokio::test]
async fn test_client_presign_stats_and_health() {
    let client = client().await;

    let presigned = client
        .presigned_url("demo-bucket", "sample-file-1.txt", Some(120))
        .await
        .unwrap();
    assert_eq!(presigned.expires_in, 120);
    assert!(presigned.url.contains("X-Amz-Expires=120"));

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.bucket_count, 2);
    assert_eq!(stats.object_count, 2);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "degraded");
    assert_eq!(health.mode, GatewayMode::Mock);
}

#[tokio::test]
async fn test_client_connection_refused() {
    let client = GatewayClient::new("http://127.0.0.1:1");
    let err = client.list_buckets().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
