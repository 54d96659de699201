//! HotDrop Remote - network adapters
//!
//! Provides:
//! - Client-credentials token acquisition
//! - Container listing and creation
//! - Two-step uploads (register the file, then PUT its bytes to the
//!   returned presigned URLs)
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 client-credentials grant
//! - [`client`] - Typed JSON client for the asset API
//! - [`upload`] - Transfer of file bytes to presigned upload URLs
//! - [`provider`] - [`IAssetService`](hotdrop_core::ports::IAssetService) implementation
//! - [`ftp`] - [`IRemoteSource`](hotdrop_core::ports::IRemoteSource) over an FTP server

pub mod auth;
pub mod client;
pub mod ftp;
pub mod provider;
pub mod upload;

use std::time::Duration;

use hotdrop_core::ports::{RemoteError, RemoteErrorKind};
use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Errors that can occur when talking to the asset API
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// Credentials were rejected or the token is invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token lacks permission for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The addressed container or upload does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded on the service side
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Value of the `Retry-After` header, when present
        retry_after: Option<Duration>,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteApiError {
    /// Maps an error response to a typed error, consuming the body
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => RemoteApiError::Unauthorized(body),
            StatusCode::FORBIDDEN => RemoteApiError::Forbidden(body),
            StatusCode::NOT_FOUND => RemoteApiError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => RemoteApiError::TooManyRequests { retry_after },
            s if s.is_server_error() => RemoteApiError::ServerError {
                status: s.as_u16(),
                body,
            },
            s => RemoteApiError::Status {
                status: s.as_u16(),
                body,
            },
        }
    }

    /// Classification used by the pipeline's retry policy
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteApiError::Unauthorized(_) | RemoteApiError::Forbidden(_) => RemoteErrorKind::Auth,
            RemoteApiError::NotFound(_) => RemoteErrorKind::NotFound,
            RemoteApiError::TooManyRequests { .. } => RemoteErrorKind::RateLimited,
            RemoteApiError::ServerError { .. } => RemoteErrorKind::Network,
            RemoteApiError::NetworkError(e) if e.is_decode() => RemoteErrorKind::Other,
            RemoteApiError::NetworkError(_) => RemoteErrorKind::Network,
            // Only the body text is left to go on
            RemoteApiError::Status { body, .. } => RemoteErrorKind::classify_message(body),
            RemoteApiError::InvalidResponse(_) | RemoteApiError::Io(_) => RemoteErrorKind::Other,
        }
    }
}

impl From<RemoteApiError> for RemoteError {
    fn from(err: RemoteApiError) -> Self {
        RemoteError::new(err.kind(), err.to_string())
    }
}

/// Returns the response if its status is a success, or the mapped error
pub(crate) async fn check_status(response: Response) -> Result<Response, RemoteApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(RemoteApiError::from_response(response).await)
    }
}
