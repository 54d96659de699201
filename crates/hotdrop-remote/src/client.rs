//! Typed JSON client for the asset API
//!
//! Every resource lives under `/accounts/{account_id}`. Response bodies
//! wrap their payload in a `data` envelope:
//!
//! ```text
//! GET  /accounts/{a}/folders/{id}/children      -> { "data": [ {id, name, type}, ... ] }
//! POST /accounts/{a}/folders/{id}/folders       -> { "data": { id, name, ... } }
//! POST /accounts/{a}/folders/{id}/files/local_upload
//!                                               -> { "data": { id, upload_urls: [...] } }
//! ```

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hotdrop_core::domain::newtypes::ContainerId;
use hotdrop_core::ports::AccessToken;

use crate::{check_status, RemoteApiError};

/// Default API root for the asset service
pub const DEFAULT_BASE_URL: &str = "https://api.frame.io/v4";

/// `type` value the API uses for container children
const FOLDER_TYPE: &str = "folder";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct CreateFolderBody<'a> {
    data: NameField<'a>,
}

#[derive(Debug, Serialize)]
struct NameField<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct LocalUploadBody<'a> {
    data: LocalUploadFields<'a>,
}

#[derive(Debug, Serialize)]
struct LocalUploadFields<'a> {
    name: &'a str,
    file_size: u64,
}

/// A direct child of a remote folder
#[derive(Debug, Clone, Deserialize)]
pub struct ChildItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
}

impl ChildItem {
    pub fn is_folder(&self) -> bool {
        self.item_type == FOLDER_TYPE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A presigned URL that receives one part of the file
#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrl {
    pub url: String,
    /// Byte count for this part; absent when the file is sent in one piece
    #[serde(default)]
    pub size: Option<u64>,
}

/// A registered upload awaiting its bytes
#[derive(Debug, Clone, Deserialize)]
pub struct LocalUpload {
    pub id: String,
    #[serde(default)]
    pub upload_urls: Vec<UploadUrl>,
}

// ============================================================================
// AssetClient
// ============================================================================

/// HTTP client bound to one account of the asset API
#[derive(Debug, Clone)]
pub struct AssetClient {
    http: Client,
    base_url: String,
    account_id: String,
}

impl AssetClient {
    /// Creates a client against [`DEFAULT_BASE_URL`]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, account_id)
    }

    /// Creates a client against a custom API root (used by tests)
    pub fn with_base_url(base_url: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), base_url, account_id)
    }

    pub fn with_http_client(
        http: Client,
        base_url: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            account_id: account_id.into(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Builds an authenticated request for a path below the account root
    fn request(&self, method: Method, path: &str, token: &AccessToken) -> RequestBuilder {
        let url = format!("{}/accounts/{}{}", self.base_url, self.account_id, path);
        self.http.request(method, url).bearer_auth(token.as_str())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteApiError> {
        let response = check_status(request.send().await?).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| RemoteApiError::InvalidResponse(e.to_string()))?;
        Ok(envelope.data)
    }

    /// Lists the direct children of `folder`
    pub async fn list_children(
        &self,
        folder: &ContainerId,
        token: &AccessToken,
    ) -> Result<Vec<ChildItem>, RemoteApiError> {
        debug!(folder = %folder, "Listing folder children");
        let path = format!("/folders/{}/children", folder.as_str());
        self.send(self.request(Method::GET, &path, token)).await
    }

    /// Creates a folder named `name` under `parent`
    pub async fn create_folder(
        &self,
        name: &str,
        parent: &ContainerId,
        token: &AccessToken,
    ) -> Result<FolderItem, RemoteApiError> {
        debug!(parent = %parent, name, "Creating folder");
        let path = format!("/folders/{}/folders", parent.as_str());
        let body = CreateFolderBody {
            data: NameField { name },
        };
        self.send(self.request(Method::POST, &path, token).json(&body))
            .await
    }

    /// Registers a local upload and returns the URLs that receive its bytes
    pub async fn create_local_upload(
        &self,
        folder: &ContainerId,
        name: &str,
        file_size: u64,
        token: &AccessToken,
    ) -> Result<LocalUpload, RemoteApiError> {
        debug!(folder = %folder, name, file_size, "Registering local upload");
        let path = format!("/folders/{}/files/local_upload", folder.as_str());
        let body = LocalUploadBody {
            data: LocalUploadFields { name, file_size },
        };
        self.send(self.request(Method::POST, &path, token).json(&body))
            .await
    }
}
