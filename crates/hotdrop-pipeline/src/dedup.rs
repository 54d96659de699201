//! Duplicate suppression
//!
//! Two things are never uploaded twice within one process lifetime:
//!
//! - content that was already uploaded successfully (keyed by SHA-256), and
//! - a path that already has a job resident in the upload queue.
//!
//! Additionally, a content hash owned by one active job blocks any other
//! path carrying the same bytes until that job reaches a terminal state.
//! Nothing here survives a restart.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hotdrop_core::domain::ContentHash;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct DedupState {
    /// Hashes confirmed uploaded
    uploaded: HashSet<ContentHash>,
    /// Paths with a job in the queue, and the hash each one carries
    active: HashMap<PathBuf, ContentHash>,
}

/// Content-hash and path based duplicate index
#[derive(Debug, Default)]
pub struct DedupIndex {
    state: Mutex<DedupState>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DedupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `path` as active with `hash` unless it is a duplicate
    ///
    /// Returns `false` without touching the index when the hash was already
    /// uploaded, the path is already active, or another active path carries
    /// the same hash.
    pub fn admit(&self, path: &Path, hash: &ContentHash) -> bool {
        let mut state = self.state();

        if state.uploaded.contains(hash) {
            info!(
                path = %path.display(),
                hash = hash.short(),
                "Skipping duplicate: content already uploaded"
            );
            return false;
        }

        if state.active.contains_key(path) {
            info!(path = %path.display(), "Skipping duplicate: path already queued");
            return false;
        }

        if let Some((other, _)) = state.active.iter().find(|(_, h)| *h == hash) {
            info!(
                path = %path.display(),
                other = %other.display(),
                hash = hash.short(),
                "Skipping duplicate: same content already queued"
            );
            return false;
        }

        state.active.insert(path.to_path_buf(), hash.clone());
        debug!(path = %path.display(), hash = hash.short(), "Admitted");
        true
    }

    /// Forgets the active entry for `path`
    ///
    /// Returns `true` if the path was active.
    pub fn release(&self, path: &Path) -> bool {
        let released = self.state().active.remove(path).is_some();
        if released {
            debug!(path = %path.display(), "Released");
        }
        released
    }

    /// Remembers `hash` as uploaded for the rest of the process lifetime
    pub fn mark_uploaded(&self, hash: &ContentHash) {
        self.state().uploaded.insert(hash.clone());
    }

    pub fn is_active(&self, path: &Path) -> bool {
        self.state().active.contains_key(path)
    }

    pub fn is_uploaded(&self, hash: &ContentHash) -> bool {
        self.state().uploaded.contains(hash)
    }

    /// Number of paths with a resident job
    pub fn active_count(&self) -> usize {
        self.state().active.len()
    }

    /// Number of distinct hashes uploaded so far
    pub fn uploaded_count(&self) -> usize {
        self.state().uploaded.len()
    }
}
