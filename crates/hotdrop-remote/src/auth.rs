//! OAuth2 client-credentials grant
//!
//! The service authenticates machine clients with a plain form POST:
//!
//! ```text
//! POST {token_url}
//!   client_id=...&client_secret=...&grant_type=client_credentials&scope=...
//! -> { "access_token": "...", "expires_in": 86399, "token_type": "bearer" }
//! ```

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use hotdrop_core::ports::AccessToken;

use crate::RemoteApiError;

/// Default identity endpoint for the client-credentials grant
pub const DEFAULT_TOKEN_URL: &str = "https://ims-na1.adobelogin.com/ims/token/v3";

/// Credentials for the client-credentials grant
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Fetches access tokens from the identity endpoint
#[derive(Debug, Clone)]
pub struct TokenProvider {
    http: Client,
    token_url: String,
    credentials: ClientCredentials,
}

impl TokenProvider {
    pub fn new(http: Client, token_url: impl Into<String>, credentials: ClientCredentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Requests a new access token
    ///
    /// Tokens are not cached; every call performs the grant.
    ///
    /// # Errors
    ///
    /// Rejected credentials (400/401/403) map to
    /// [`RemoteApiError::Unauthorized`] so the pipeline applies its
    /// authentication backoff.
    pub async fn fetch_token(&self) -> Result<AccessToken, RemoteApiError> {
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.credentials.scope.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token request rejected");
            return Err(RemoteApiError::Unauthorized(format!(
                "Authentication failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let response = crate::check_status(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RemoteApiError::InvalidResponse(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(RemoteApiError::InvalidResponse(
                "token response carried an empty access_token".to_string(),
            ));
        }

        debug!(expires_in = ?token.expires_in, "Obtained access token");
        Ok(AccessToken::new(token.access_token))
    }
}
