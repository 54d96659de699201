//! Token acquisition through `IAssetService::authenticate`

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use hotdrop_core::ports::{IAssetService, RemoteErrorKind};

use crate::common;

#[tokio::test]
async fn test_authenticate_posts_client_credentials() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-test"))
        .and(body_string_contains("client_secret=secret-test"))
        .and(body_string_contains("scope="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "expires_in": 86399
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = service.authenticate().await.unwrap();
    assert_eq!(token.as_str(), "fresh-token");
}

#[tokio::test]
async fn test_authenticate_fetches_a_new_token_each_call() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "t"
        })))
        .expect(2)
        .mount(&server)
        .await;

    service.authenticate().await.unwrap();
    service.authenticate().await.unwrap();
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_errors() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "invalid client_secret parameter"
        })))
        .mount(&server)
        .await;

    let err = service.authenticate().await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Auth);
    assert!(err.message.contains("invalid_client"));
}

#[tokio::test]
async fn test_identity_outage_is_network_error() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = service.authenticate().await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Network);
}

#[tokio::test]
async fn test_malformed_token_response_is_other() {
    let (server, service) = common::setup_asset_mock().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service.authenticate().await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Other);
}
