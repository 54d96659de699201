//! HotDrop Pipeline - hot-folder ingest engine
//!
//! Provides:
//! - File stability detection before anything is queued
//! - Content-hash and path based duplicate suppression
//! - A global token-bucket rate limiter
//! - An ordered upload queue with a single retrying worker
//! - Folder-structure reconciliation against the remote container tree
//! - Filesystem and polling source watchers
//!
//! ## Flow
//!
//! ```text
//! FsWatcher / PollingWatcher ──→ mpsc ──→ Intake ──→ StabilityDetector
//!                                           │
//!                          hash ──→ DedupIndex ──→ UploadQueue ──→ UploadWorker
//!                                                                    │
//!                                                  RateLimiter ──→ IAssetService
//! ```

pub mod dedup;
pub mod folder_sync;
pub mod hashing;
pub mod ignore;
pub mod intake;
pub mod poller;
pub mod queue;
pub mod rate_limit;
pub mod source_dir;
pub mod stability;
pub mod watcher;
pub mod worker;

use std::path::PathBuf;

use hotdrop_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur inside the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The specified path does not exist or is not a directory
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A configuration value cannot drive the pipeline
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A domain-level error propagated from hotdrop-core
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}
