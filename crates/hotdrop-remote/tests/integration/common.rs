//! Shared helpers for asset API integration tests
//!
//! Every helper targets a single `MockServer` that serves the token
//! endpoint at [`TOKEN_PATH`] and the API below `/v4`.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hotdrop_core::config::RemoteConfig;
use hotdrop_core::domain::newtypes::ContainerId;
use hotdrop_core::ports::AccessToken;
use hotdrop_remote::provider::HttpAssetService;

pub const TOKEN_PATH: &str = "/ims/token/v3";
pub const ACCOUNT_ID: &str = "acc-test-001";
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a service pointed at it
///
/// No endpoints are mounted; tests mount what they exercise.
pub async fn setup_asset_mock() -> (MockServer, HttpAssetService) {
    let server = MockServer::start().await;

    let config = RemoteConfig {
        base_url: format!("{}/v4", server.uri()),
        token_url: format!("{}{}", server.uri(), TOKEN_PATH),
        account_id: Some(ACCOUNT_ID.to_string()),
        client_id: Some("client-test".to_string()),
        client_secret: Some("secret-test".to_string()),
        ..RemoteConfig::default()
    };
    let service = HttpAssetService::from_config(&config).expect("service from config");

    (server, service)
}

/// API path below the account root
pub fn api_path(suffix: &str) -> String {
    format!("/v4/accounts/{}{}", ACCOUNT_ID, suffix)
}

pub fn token() -> AccessToken {
    AccessToken::new(ACCESS_TOKEN)
}

pub fn container(id: &str) -> ContainerId {
    ContainerId::new(id).expect("valid container id")
}

/// Mounts a successful token response
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": 86399
        })))
        .mount(server)
        .await;
}

/// Mounts a children listing for `folder_id`
pub async fn mount_children(server: &MockServer, folder_id: &str, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(api_path(&format!("/folders/{}/children", folder_id))))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": items })),
        )
        .mount(server)
        .await;
}

/// Mounts an error response for any request to `api_suffix` with `verb`
pub async fn mount_error(server: &MockServer, verb: &str, api_suffix: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(api_path(api_suffix)))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "errors": [{ "detail": "mock failure" }]
        })))
        .mount(server)
        .await;
}
