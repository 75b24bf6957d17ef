//! Unit tests for the cache service client

use super::*;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> CacheServiceClient {
    CacheServiceClient::new(&ServiceConfig {
        base_url: server.uri(),
        token: "test-token".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_requests_carry_auth_and_pinned_accept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_apis/artifactcache/cache"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Accept", "application/json;api-version=6.0-preview.1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let entry = client.get_cache_entry("magpie-demo", "v1").await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_base_url_trailing_slash_is_normalized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_apis/artifactcache/cache"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = CacheServiceClient::new(&ServiceConfig {
        base_url: format!("{}/", server.uri()),
        token: "test-token".to_string(),
    })
    .unwrap();

    assert!(client
        .get_cache_entry("magpie-demo", "v1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_get_cache_entry_sends_key_and_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_apis/artifactcache/cache"))
        .and(query_param("keys", "magpie-demo"))
        .and(query_param("version", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "archiveLocation": "https://blob.example/archive",
            "cacheKey": "magpie-demo"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let entry = client
        .get_cache_entry("magpie-demo", "abc123")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        entry.archive_location.as_deref(),
        Some("https://blob.example/archive")
    );
    assert_eq!(entry.cache_key.as_deref(), Some("magpie-demo"));
}

#[tokio::test]
async fn test_get_cache_entry_accepts_pascal_case_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_apis/artifactcache/cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ArchiveLocation": "https://blob.example/archive"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let entry = client.get_cache_entry("k", "v").await.unwrap().unwrap();
    assert_eq!(
        entry.archive_location.as_deref(),
        Some("https://blob.example/archive")
    );
}

#[tokio::test]
async fn test_get_cache_entry_error_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_apis/artifactcache/cache"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_cache_entry("k", "v").await;

    match result.unwrap_err() {
        MagpieError::Network { message, .. } => assert!(message.contains("500")),
        other => panic!("Expected Network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reserve_cache_returns_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches"))
        .and(body_json(serde_json::json!({
            "key": "magpie-demo",
            "version": "abc123",
            "cacheSize": 1024
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "cacheId": 42
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let id = client
        .reserve_cache("magpie-demo", "abc123", 1024)
        .await
        .unwrap();
    assert_eq!(id, 42);
}

#[tokio::test]
async fn test_reserve_cache_failure_surfaces_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches"))
        .respond_with(ResponseTemplate::new(400).set_body_string("insufficient quota"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.reserve_cache("k", "v", 1).await;

    match result.unwrap_err() {
        MagpieError::Reserve { message } => assert_eq!(message, "insufficient quota"),
        other => panic!("Expected Reserve error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reserve_cache_rejects_non_positive_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cacheId": 0
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.reserve_cache("k", "v", 1).await;

    match result.unwrap_err() {
        MagpieError::Reserve { message } => assert_eq!(message, "invalid reserve response"),
        other => panic!("Expected Reserve error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reserve_cache_rejects_missing_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    assert!(matches!(
        client.reserve_cache("k", "v", 1).await,
        Err(MagpieError::Reserve { .. })
    ));
}

#[tokio::test]
async fn test_upload_chunk_sets_range_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/_apis/artifactcache/caches/42"))
        .and(header("Content-Type", "application/octet-stream"))
        .and(header("Content-Range", "bytes 5-9/*"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client
        .upload_chunk(42, 5, vec![1, 2, 3, 4, 5])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_chunk_failure_surfaces_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/_apis/artifactcache/caches/42"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.upload_chunk(42, 0, vec![0u8; 4]).await;

    match result.unwrap_err() {
        MagpieError::Upload { message } => assert_eq!(message, "disk full"),
        other => panic!("Expected Upload error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_commit_cache_posts_final_size() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches/42"))
        .and(body_json(serde_json::json!({ "size": 1024 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.commit_cache(42, 1024).await.unwrap();
}

#[tokio::test]
async fn test_commit_cache_failure_is_commit_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_apis/artifactcache/caches/42"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already committed"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.commit_cache(42, 1024).await;

    match result.unwrap_err() {
        MagpieError::Commit { message } => assert_eq!(message, "already committed"),
        other => panic!("Expected Commit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_archive_streams_to_file() {
    let server = MockServer::start().await;
    let payload = vec![7u8; 4096];

    Mock::given(method("GET"))
        .and(path("/blob/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("archive.tar.zst");

    let written = download_archive(&format!("{}/blob/archive", server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
}

#[tokio::test]
async fn test_download_archive_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blob/archive"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("archive.tar.zst");

    let result = download_archive(&format!("{}/blob/archive", server.uri()), &dest).await;
    assert!(matches!(result, Err(MagpieError::Network { .. })));
}
