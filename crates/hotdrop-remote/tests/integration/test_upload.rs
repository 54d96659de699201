//! Two-step uploads: register, then PUT to presigned URLs

use std::path::PathBuf;

use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hotdrop_core::ports::{IAssetService, RemoteErrorKind};

use crate::common;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn mount_local_upload(server: &MockServer, name: &str, size: u64, urls: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(common::api_path("/folders/root-1/files/local_upload")))
        .and(body_json(serde_json::json!({
            "data": { "name": name, "file_size": size }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "file-001", "name": name, "upload_urls": urls }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_single_part() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "A001.mov", "frames");

    mount_local_upload(
        &server,
        "A001.mov",
        6,
        serde_json::json!([{ "url": format!("{}/upload/part-1", server.uri()) }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/upload/part-1"))
        .and(header("x-amz-acl", "private"))
        .and(header("content-type", "application/octet-stream"))
        .and(body_string("frames"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let asset = service
        .upload_asset(&file, &common::container("root-1"), &common::token())
        .await
        .unwrap();
    assert_eq!(asset.as_str(), "file-001");
}

#[tokio::test]
async fn test_upload_splits_file_across_parts() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "big.bin", "abcdefgh");

    mount_local_upload(
        &server,
        "big.bin",
        8,
        serde_json::json!([
            { "url": format!("{}/upload/p1", server.uri()), "size": 3 },
            { "url": format!("{}/upload/p2", server.uri()), "size": 3 },
            { "url": format!("{}/upload/p3", server.uri()), "size": 2 }
        ]),
    )
    .await;

    for (part, body) in [("/upload/p1", "abc"), ("/upload/p2", "def"), ("/upload/p3", "gh")] {
        Mock::given(method("PUT"))
            .and(path(part))
            .and(header("content-length", body.len().to_string()))
            .and(body_string(body))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    service
        .upload_asset(&file, &common::container("root-1"), &common::token())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_part_is_network_error() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "A002.mov", "frames");

    mount_local_upload(
        &server,
        "A002.mov",
        6,
        serde_json::json!([{ "url": format!("{}/upload/part-1", server.uri()) }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/upload/part-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = service
        .upload_asset(&file, &common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Network);
}

#[tokio::test]
async fn test_registration_rejected_is_auth_error() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "A003.mov", "frames");

    common::mount_error(&server, "POST", "/folders/root-1/files/local_upload", 401).await;

    let err = service
        .upload_asset(&file, &common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_missing_upload_urls_is_other() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "A004.mov", "frames");

    mount_local_upload(&server, "A004.mov", 6, serde_json::json!([])).await;

    let err = service
        .upload_asset(&file, &common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Other);
}

#[tokio::test]
async fn test_missing_local_file_does_not_contact_service() {
    let (server, service) = common::setup_asset_mock().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = service
        .upload_asset(
            &dir.path().join("gone.mov"),
            &common::container("root-1"),
            &common::token(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Other);
}

#[tokio::test]
async fn test_token_then_upload_end_to_end() {
    let (server, service) = common::setup_asset_mock().await;
    common::mount_token(&server).await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "A005.mov", "xy");

    mount_local_upload(
        &server,
        "A005.mov",
        2,
        serde_json::json!([{ "url": format!("{}/upload/part-1", server.uri()) }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/upload/part-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let token = service.authenticate().await.unwrap();
    let asset = service
        .upload_asset(&file, &common::container("root-1"), &token)
        .await
        .unwrap();
    assert_eq!(asset.as_str(), "file-001");
}
