//! Domain entities
//!
//! - Newtypes for remote identifiers and content hashes
//! - Files discovered by a source watcher
//! - Upload jobs and their state machine
//! - Domain-specific error types

pub mod discovered;
pub mod errors;
pub mod job;
pub mod newtypes;

pub use discovered::{DiscoveredFile, DiscoveryKind};
pub use errors::DomainError;
pub use job::{JobState, UploadJob};
pub use newtypes::{AssetId, ContainerId, ContentHash};
