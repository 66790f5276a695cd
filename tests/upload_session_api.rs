//! Route-level tests for the upload session API.
//!
//! The S3 endpoint points at an unreachable loopback port: presigned URL
//! generation is a local computation, so grant minting works without a live
//! backend, and the connect check in the client degrades to a warning.

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use arkvault::config::{Config, StorageConfig, StorageProvider};
use arkvault::state::AppState;
use arkvault::storage::S3Client;

async fn test_server() -> TestServer {
    let mut config = Config::default();
    config.storage = StorageConfig {
        provider: StorageProvider::Minio,
        endpoint: "http://127.0.0.1:9".to_string(),
        bucket: "vault-objects".to_string(),
        access_key: "test-access".to_string(),
        secret_key: "test-secret".to_string(),
        region: None,
    };

    let s3_client = S3Client::new(&config.storage)
        .await
        .expect("client construction is local");

    let app_state = AppState::new(config, s3_client.clone());
    let uploads_state = arkvault::routes::uploads::UploadsState {
        sessions: app_state.sessions().clone(),
        s3_client,
    };

    let app = Router::new()
        .nest("/api/v1/uploads", arkvault::routes::uploads::router(uploads_state))
        .with_state(app_state);

    TestServer::new(app).expect("test server")
}

fn two_file_request(session_id: Option<&str>) -> Value {
    json!({
        "sessionId": session_id,
        "files": [
            { "relPath": "docs/a.txt", "size": 10, "contentType": "text/plain" },
            { "relPath": "img/logo.png", "size": 20, "contentType": "image/png" },
        ]
    })
}

#[tokio::test]
async fn test_start_session_returns_full_plan() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/uploads/session")
        .json(&two_file_request(Some("build-42")))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["sessionId"], "build-42");
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["relPath"], "docs/a.txt");
    assert_eq!(items[0]["objectKey"], "vaults/build-42/docs/a.txt");
    assert_eq!(
        items[0]["storageUri"],
        "s3://vault-objects/vaults/build-42/docs/a.txt"
    );
    assert!(items[0]["uploadUrl"]
        .as_str()
        .unwrap()
        .contains("vaults/build-42/docs/a.txt"));
    assert!(items[0]["expiresAt"].is_string());
    assert_eq!(items[1]["objectKey"], "vaults/build-42/img/logo.png");
}

#[tokio::test]
async fn test_server_generates_session_id() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/uploads/session")
        .json(&two_file_request(None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let id = body["sessionId"].as_str().unwrap();
    assert!(id.len() >= 6);
}

#[tokio::test]
async fn test_empty_file_list_is_rejected() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/uploads/session")
        .json(&json!({ "files": [] }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "session_error");
}

#[tokio::test]
async fn test_malformed_session_id_is_rejected() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/uploads/session")
        .json(&json!({
            "sessionId": "bad id!",
            "files": [{ "relPath": "a.txt", "size": 1, "contentType": "text/plain" }]
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_traversal_paths_stay_inside_namespace() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/uploads/session")
        .json(&json!({
            "sessionId": "build-42",
            "files": [{ "relPath": "../../etc/passwd", "size": 1, "contentType": "text/plain" }]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"][0]["objectKey"], "vaults/build-42/etc/passwd");
}
