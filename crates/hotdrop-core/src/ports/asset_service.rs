//! Asset service port (driven/secondary port)
//!
//! The pipeline depends on four operations of the remote asset service and
//! implements none of them. Adapters classify their failures into a
//! [`RemoteErrorKind`] at the boundary so that retry decisions are a
//! structural match instead of inspecting error text.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::domain::newtypes::{AssetId, ContainerId};

// ============================================================================
// AccessToken
// ============================================================================

/// Bearer token returned by [`IAssetService::authenticate`]
///
/// Tokens are not assumed to be long-lived; the upload worker obtains a
/// fresh one before every attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ============================================================================
// RemoteEntry
// ============================================================================

/// A child of a remote container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Display name of the entry
    pub name: String,
    /// Provider-specific identifier
    pub id: String,
    /// Whether the entry is itself a container
    pub is_container: bool,
}

// ============================================================================
// RemoteError
// ============================================================================

/// Coarse classification of a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Credentials rejected or a token could not be obtained
    Auth,
    /// Transport failure or server-side (5xx) error
    Network,
    /// The addressed container or asset does not exist
    NotFound,
    /// The service asked us to slow down
    RateLimited,
    /// Anything else the adapter could not classify
    Other,
}

/// Substrings that mark an otherwise unstructured error message as an
/// authentication failure
const AUTH_MARKERS: &[&str] = &[
    "authentication",
    "invalid_client",
    "missing client_id",
    "unauthorized",
];

impl RemoteErrorKind {
    /// Classifies free-form error text
    ///
    /// Only for adapters whose failure source offers nothing better than a
    /// message; structured adapters map status codes directly.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
            RemoteErrorKind::Auth
        } else {
            RemoteErrorKind::Other
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteErrorKind::Auth => "auth",
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::RateLimited => "rate_limited",
            RemoteErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Error returned by every [`IAssetService`] operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Auth, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    /// Builds an error from unstructured text using
    /// [`RemoteErrorKind::classify_message`]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(RemoteErrorKind::classify_message(&message), message)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == RemoteErrorKind::Auth
    }
}

// ============================================================================
// IAssetService trait
// ============================================================================

/// Port trait for the remote asset service
///
/// Implementations must be callable concurrently; the pipeline shares one
/// instance between the upload worker and the folder-sync planner.
#[async_trait::async_trait]
pub trait IAssetService: Send + Sync {
    /// Obtains a fresh access token
    async fn authenticate(&self) -> Result<AccessToken, RemoteError>;

    /// Uploads the file at `local_path` into `target`
    async fn upload_asset(
        &self,
        local_path: &Path,
        target: &ContainerId,
        token: &AccessToken,
    ) -> Result<AssetId, RemoteError>;

    /// Lists the direct children of a container
    async fn list_container_children(
        &self,
        container: &ContainerId,
        token: &AccessToken,
    ) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Creates a container named `name` under `parent`
    async fn create_container(
        &self,
        name: &str,
        parent: &ContainerId,
        token: &AccessToken,
    ) -> Result<ContainerId, RemoteError>;
}
