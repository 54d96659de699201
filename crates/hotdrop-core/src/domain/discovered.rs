//! Files reported by a source watcher

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// How a file came to appear in the watched location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryKind {
    /// The file was created in place (or staged by a polling source)
    Created,
    /// The file was renamed or moved into the watched location
    Moved,
}

/// A file noticed by a source watcher, not yet checked for stability
///
/// Consumed once by the intake stage; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path of the file on local disk
    pub path: PathBuf,
    /// Event that surfaced the file
    pub kind: DiscoveryKind,
    /// When the watcher observed the event
    pub observed_at: DateTime<Utc>,
}

impl DiscoveredFile {
    /// Creates a discovery stamped with the current time
    pub fn new(path: impl Into<PathBuf>, kind: DiscoveryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at: Utc::now(),
        }
    }

    /// Returns the path of the discovered file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
