//! Container listing and creation

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use hotdrop_core::ports::{IAssetService, RemoteErrorKind};

use crate::common;

#[tokio::test]
async fn test_list_children_maps_folders_to_containers() {
    let (server, service) = common::setup_asset_mock().await;

    common::mount_children(
        &server,
        "root-1",
        serde_json::json!([
            { "id": "f-1", "name": "Dailies", "type": "folder" },
            { "id": "a-1", "name": "clip.mov", "type": "file" },
            { "id": "v-1", "name": "Stack", "type": "version_stack" }
        ]),
    )
    .await;

    let children = service
        .list_container_children(&common::container("root-1"), &common::token())
        .await
        .unwrap();

    assert_eq!(children.len(), 3);
    assert_eq!(children[0].name, "Dailies");
    assert_eq!(children[0].id, "f-1");
    assert!(children[0].is_container);
    assert!(!children[1].is_container);
    assert!(!children[2].is_container);
}

#[tokio::test]
async fn test_list_children_sends_bearer_token() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("GET"))
        .and(path(common::api_path("/folders/root-1/children")))
        .and(header(
            "authorization",
            format!("Bearer {}", common::ACCESS_TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let children = service
        .list_container_children(&common::container("root-1"), &common::token())
        .await
        .unwrap();
    assert!(children.is_empty());
}

#[tokio::test]
async fn test_list_missing_folder_is_not_found() {
    let (server, service) = common::setup_asset_mock().await;
    common::mount_error(&server, "GET", "/folders/gone/children", 404).await;

    let err = service
        .list_container_children(&common::container("gone"), &common::token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::NotFound);
}

#[tokio::test]
async fn test_throttled_listing_is_rate_limited() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("GET"))
        .and(path(common::api_path("/folders/root-1/children")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "5"))
        .mount(&server)
        .await;

    let err = service
        .list_container_children(&common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::RateLimited);
}

#[tokio::test]
async fn test_create_container_posts_name_under_parent() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::api_path("/folders/root-1/folders")))
        .and(body_json(serde_json::json!({ "data": { "name": "Day 02" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "f-new", "name": "Day 02", "type": "folder" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = service
        .create_container("Day 02", &common::container("root-1"), &common::token())
        .await
        .unwrap();
    assert_eq!(id.as_str(), "f-new");
}

#[tokio::test]
async fn test_create_container_with_expired_token_is_auth_error() {
    let (server, service) = common::setup_asset_mock().await;
    common::mount_error(&server, "POST", "/folders/root-1/folders", 401).await;

    let err = service
        .create_container("Day 02", &common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_create_container_missing_data_is_other() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::api_path("/folders/root-1/folders")))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "x" })))
        .mount(&server)
        .await;

    let err = service
        .create_container("Day 02", &common::container("root-1"), &common::token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Other);
}
