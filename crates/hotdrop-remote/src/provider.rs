//! [`IAssetService`] implementation over the HTTP API
//!
//! Combines [`TokenProvider`] and [`AssetClient`] behind the port trait and
//! converts [`RemoteApiError`] into the pipeline's [`RemoteError`] at the
//! boundary.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::{debug, info};

use hotdrop_core::config::RemoteConfig;
use hotdrop_core::domain::newtypes::{AssetId, ContainerId};
use hotdrop_core::ports::{AccessToken, IAssetService, RemoteEntry, RemoteError};

use crate::auth::{ClientCredentials, TokenProvider};
use crate::client::AssetClient;
use crate::{upload, RemoteApiError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Asset service backed by the HTTP API
#[derive(Debug, Clone)]
pub struct HttpAssetService {
    tokens: TokenProvider,
    client: AssetClient,
}

impl HttpAssetService {
    pub fn new(tokens: TokenProvider, client: AssetClient) -> Self {
        Self { tokens, client }
    }

    /// Builds the service from the `remote` configuration section
    ///
    /// # Errors
    ///
    /// Fails if `account_id`, `client_id` or `client_secret` is missing, or
    /// if the HTTP client cannot be constructed.
    pub fn from_config(config: &RemoteConfig) -> anyhow::Result<Self> {
        let account_id = required(&config.account_id, "remote.account_id")?;
        let client_id = required(&config.client_id, "remote.client_id")?;
        let client_secret = required(&config.client_secret, "remote.client_secret")?;

        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let credentials = ClientCredentials {
            client_id,
            client_secret,
            scope: config.scope.clone(),
        };
        let tokens = TokenProvider::new(http.clone(), config.token_url.clone(), credentials);
        let client = AssetClient::with_http_client(http, config.base_url.clone(), account_id);

        info!(
            base_url = %client.base_url(),
            account_id = %client.account_id(),
            "Asset service configured"
        );
        Ok(Self::new(tokens, client))
    }

    pub fn client(&self) -> &AssetClient {
        &self.client
    }
}

fn required(value: &Option<String>, field: &str) -> anyhow::Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => anyhow::bail!("{} is not configured", field),
    }
}

fn file_name(path: &Path) -> Result<&str, RemoteApiError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            RemoteApiError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no usable file name in {}", path.display()),
            ))
        })
}

impl HttpAssetService {
    async fn upload(
        &self,
        local_path: &Path,
        target: &ContainerId,
        token: &AccessToken,
    ) -> Result<AssetId, RemoteApiError> {
        let name = file_name(local_path)?;
        let file_size = tokio::fs::metadata(local_path).await?.len();

        let registered = self
            .client
            .create_local_upload(target, name, file_size, token)
            .await?;
        debug!(
            asset_id = %registered.id,
            parts = registered.upload_urls.len(),
            "Upload registered"
        );

        upload::put_parts(
            self.client.http(),
            local_path,
            &registered.upload_urls,
            file_size,
        )
        .await?;

        AssetId::new(registered.id).map_err(|e| RemoteApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl IAssetService for HttpAssetService {
    async fn authenticate(&self) -> Result<AccessToken, RemoteError> {
        self.tokens.fetch_token().await.map_err(RemoteError::from)
    }

    async fn upload_asset(
        &self,
        local_path: &Path,
        target: &ContainerId,
        token: &AccessToken,
    ) -> Result<AssetId, RemoteError> {
        let asset_id = self
            .upload(local_path, target, token)
            .await
            .map_err(RemoteError::from)?;
        info!(path = %local_path.display(), asset_id = %asset_id, "Asset uploaded");
        Ok(asset_id)
    }

    async fn list_container_children(
        &self,
        container: &ContainerId,
        token: &AccessToken,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        let items = self.client.list_children(container, token).await?;
        Ok(items
            .into_iter()
            .map(|item| RemoteEntry {
                is_container: item.is_folder(),
                name: item.name,
                id: item.id,
            })
            .collect())
    }

    async fn create_container(
        &self,
        name: &str,
        parent: &ContainerId,
        token: &AccessToken,
    ) -> Result<ContainerId, RemoteError> {
        let folder = self.client.create_folder(name, parent, token).await?;
        ContainerId::new(folder.id)
            .map_err(|e| RemoteApiError::InvalidResponse(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_config() -> RemoteConfig {
        RemoteConfig {
            account_id: Some("acc-1".into()),
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_from_config_requires_account() {
        let mut config = remote_config();
        config.account_id = None;
        let err = HttpAssetService::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("remote.account_id"));
    }

    #[test]
    fn test_from_config_rejects_blank_secret() {
        let mut config = remote_config();
        config.client_secret = Some("   ".into());
        let err = HttpAssetService::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("remote.client_secret"));
    }

    #[test]
    fn test_from_config_uses_configured_endpoints() {
        let mut config = remote_config();
        config.base_url = "http://localhost:1234/v4/".into();
        config.token_url = "http://localhost:1234/token".into();
        let service = HttpAssetService::from_config(&config).unwrap();
        assert_eq!(service.client().base_url(), "http://localhost:1234/v4");
        assert_eq!(service.client().account_id(), "acc-1");
        assert_eq!(service.tokens.token_url(), "http://localhost:1234/token");
    }

    #[test]
    fn test_file_name_requires_name() {
        assert_eq!(file_name(Path::new("/drop/a.mov")).unwrap(), "a.mov");
        assert!(file_name(Path::new("/")).is_err());
    }
}
