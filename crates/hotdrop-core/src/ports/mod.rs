//! Port definitions (hexagonal architecture interfaces)
//!
//! - [`IAssetService`] - The remote asset service files are forwarded to
//! - [`IRemoteSource`] - A polled origin of new files (FTP drop, mounted share)

pub mod asset_service;
pub mod remote_source;

pub use asset_service::{AccessToken, IAssetService, RemoteEntry, RemoteError, RemoteErrorKind};
pub use remote_source::{IRemoteSource, RemoteFileInfo};
