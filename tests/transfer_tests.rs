//! Upload executor tests against a loopback HTTP server.
//!
//! The server plays the storage backend: one route accepts PUTs, another
//! rejects them the way an expired grant would. Concurrency is pinned to 1 so
//! the abort point in the batch is deterministic.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::put;
use axum::Router;
use chrono::Utc;
use tempfile::TempDir;

use arkvault::session::types::{UploadGrant, UploadSession};
use arkvault::transfer::{FileOutcome, TransferError, TransferProgress, UploadExecutor};
use arkvault::vault::collect::LogicalFile;

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/ok/*key", put(|_body: Bytes| async { StatusCode::OK }))
        .route(
            "/forbidden/*key",
            put(|_body: Bytes| async {
                (StatusCode::FORBIDDEN, "AccessDenied: grant expired")
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn grant(addr: SocketAddr, rel_path: &str, route: &str) -> UploadGrant {
    UploadGrant {
        rel_path: rel_path.to_string(),
        object_key: format!("vaults/abcdef/{}", rel_path),
        storage_uri: format!("s3://bucket/vaults/abcdef/{}", rel_path),
        upload_url: format!("http://{}/{}/{}", addr, route, rel_path),
        content_type: "application/octet-stream".to_string(),
        expires_at: Utc::now() + chrono::Duration::minutes(30),
    }
}

async fn local_file(dir: &TempDir, rel_path: &str, contents: &[u8]) -> LogicalFile {
    let path: PathBuf = dir.path().join(rel_path.replace('/', "_"));
    tokio::fs::write(&path, contents).await.unwrap();
    LogicalFile {
        relative_path: rel_path.to_string(),
        size_bytes: contents.len() as u64,
        content_type: "application/octet-stream".to_string(),
        source: path,
    }
}

#[tokio::test]
async fn test_full_batch_completes() {
    let addr = spawn_backend().await;
    let tmp = TempDir::new().unwrap();

    let files = vec![
        local_file(&tmp, "a.bin", b"aaaa").await,
        local_file(&tmp, "b.bin", b"bbbbbb").await,
    ];
    let session = UploadSession {
        session_id: "abcdef".to_string(),
        items: vec![grant(addr, "a.bin", "ok"), grant(addr, "b.bin", "ok")],
    };

    let executor = UploadExecutor::new();
    let report = executor.execute(&session, &files).await.unwrap();

    assert!(report.is_fully_complete());
    assert_eq!(report.completed_count(), 2);
    assert_eq!(report.bytes_sent, 10);
}

#[tokio::test]
async fn test_failure_mid_batch_names_item_and_preserves_progress() {
    let addr = spawn_backend().await;
    let tmp = TempDir::new().unwrap();

    let names = ["f1.bin", "f2.bin", "f3.bin", "f4.bin", "f5.bin"];
    let mut files = Vec::new();
    for name in names {
        files.push(local_file(&tmp, name, b"payload").await);
    }

    // Item 3 of 5 hits the rejecting route
    let session = UploadSession {
        session_id: "abcdef".to_string(),
        items: vec![
            grant(addr, "f1.bin", "ok"),
            grant(addr, "f2.bin", "ok"),
            grant(addr, "f3.bin", "forbidden"),
            grant(addr, "f4.bin", "ok"),
            grant(addr, "f5.bin", "ok"),
        ],
    };

    // Serial transfers make the abort point deterministic
    let executor = UploadExecutor::new().with_max_in_flight(1);
    let err = executor.execute(&session, &files).await.unwrap_err();

    let TransferError::UploadFailed {
        rel_path,
        status,
        body,
        report,
        ..
    } = err;

    assert_eq!(rel_path, "f3.bin");
    assert_eq!(status, Some(403));
    assert!(body.contains("AccessDenied"));

    assert!(matches!(
        report.files[0].outcome,
        FileOutcome::Completed { bytes: 7 }
    ));
    assert!(matches!(
        report.files[1].outcome,
        FileOutcome::Completed { .. }
    ));
    assert!(matches!(report.files[2].outcome, FileOutcome::Failed { .. }));
    assert!(matches!(report.files[3].outcome, FileOutcome::Unattempted));
    assert!(matches!(report.files[4].outcome, FileOutcome::Unattempted));
    assert_eq!(report.completed_count(), 2);
}

#[tokio::test]
async fn test_unmatched_plan_items_are_skipped_not_errors() {
    let addr = spawn_backend().await;
    let tmp = TempDir::new().unwrap();

    let files = vec![local_file(&tmp, "present.bin", b"data").await];
    let session = UploadSession {
        session_id: "abcdef".to_string(),
        items: vec![
            grant(addr, "present.bin", "ok"),
            grant(addr, "missing.bin", "ok"),
        ],
    };

    let executor = UploadExecutor::new();
    let report = executor.execute(&session, &files).await.unwrap();

    assert!(matches!(
        report.files[0].outcome,
        FileOutcome::Completed { .. }
    ));
    assert!(matches!(
        report.files[1].outcome,
        FileOutcome::SkippedNoLocalFile
    ));
    assert!(report.is_fully_complete());
}

#[tokio::test]
async fn test_progress_reaches_total_bytes() {
    let addr = spawn_backend().await;
    let tmp = TempDir::new().unwrap();

    let files = vec![
        local_file(&tmp, "a.bin", &[0u8; 1000]).await,
        local_file(&tmp, "b.bin", &[0u8; 500]).await,
    ];
    let session = UploadSession {
        session_id: "abcdef".to_string(),
        items: vec![grant(addr, "a.bin", "ok"), grant(addr, "b.bin", "ok")],
    };

    let progress = TransferProgress::new(1500, 2);
    let executor = UploadExecutor::new();
    executor
        .execute_with_progress(&session, &files, &progress)
        .await
        .unwrap();

    let snap = progress.snapshot();
    assert_eq!(snap.bytes_sent, 1500);
    assert_eq!(snap.items_done, 2);
    assert_eq!(snap.percent(), 100.0);
}

#[tokio::test]
async fn test_transport_failure_has_no_status() {
    let tmp = TempDir::new().unwrap();
    let files = vec![local_file(&tmp, "a.bin", b"data").await];

    // Nothing listens on this port
    let dead: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let session = UploadSession {
        session_id: "abcdef".to_string(),
        items: vec![grant(dead, "a.bin", "ok")],
    };

    let executor = UploadExecutor::new();
    let err = executor.execute(&session, &files).await.unwrap_err();

    let TransferError::UploadFailed { status, report, .. } = err;
    assert_eq!(status, None);
    assert_eq!(report.completed_count(), 0);
}
