//! Hot-folder watcher
//!
//! Wraps the `notify` crate to watch a single directory (non-recursively)
//! and turns file creations and moves into [`DiscoveredFile`] values.
//!
//! ## Architecture
//!
//! ```text
//! inotify / FSEvents / kqueue
//!       │
//!       ▼
//!  FsWatcher ──→ map_notify_event ──→ mpsc::Sender<DiscoveredFile> ──→ Intake
//! ```
//!
//! Only `Create` and rename-to events matter for a hot folder: a finished
//! export is either written in place or renamed from a temporary name.
//! Modifications, removals and access events are ignored, and so are
//! directories and transient/system files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hotdrop_core::domain::{DiscoveredFile, DiscoveryKind};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ignore::should_ignore;

/// Watches one directory using the OS-native mechanism
///
/// Dropping the watcher stops event delivery and releases its sender.
///
/// ## Usage
///
/// ```ignore
/// let (tx, rx) = tokio::sync::mpsc::channel(1024);
/// let mut watcher = FsWatcher::new(tx)?;
/// watcher.watch(Path::new("/srv/hotdrop"))?;
/// // rx.recv().await yields DiscoveredFile values
/// ```
pub struct FsWatcher {
    watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl FsWatcher {
    /// Creates a watcher that sends discoveries to `tx`
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new(tx: mpsc::Sender<DiscoveredFile>) -> Result<Self> {
        info!("Initializing hot-folder watcher");

        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(discovered) = map_notify_event(&event) else {
                        return;
                    };
                    if discovered.path.is_dir() {
                        debug!(path = %discovered.path.display(), "Ignoring directory");
                        return;
                    }
                    if let Err(e) = tx.blocking_send(discovered) {
                        warn!(error = %e, "Failed to send discovered file (receiver dropped)");
                    }
                }
                Err(err) => {
                    error!(error = %err, "File watcher error");
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        Ok(Self {
            watcher,
            watched: Vec::new(),
        })
    }

    /// Starts watching `dir` (its direct children only)
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (missing, permission
    /// denied, or the inotify watch limit reached)
    pub fn watch(&mut self, dir: &Path) -> Result<()> {
        info!(path = %dir.display(), "Watching hot folder");

        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path: {}", dir.display()))?;
        self.watched.push(dir.to_path_buf());
        Ok(())
    }

    /// Stops watching `dir`
    pub fn unwatch(&mut self, dir: &Path) -> Result<()> {
        info!(path = %dir.display(), "Stopping watch");

        self.watcher
            .unwatch(dir)
            .with_context(|| format!("Failed to unwatch path: {}", dir.display()))?;
        self.watched.retain(|p| p != dir);
        Ok(())
    }

    /// Directories currently watched
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

/// Converts a `notify::Event` into a [`DiscoveredFile`]
///
/// - `Create(Folder)` -> ignored
/// - `Create(*)` -> `Created`
/// - `Modify(Name(To))` -> `Moved` (the single path is the destination)
/// - `Modify(Name(Both))` with 2 paths -> `Moved` (second path)
/// - anything else -> ignored
///
/// Transient and system file names are filtered here as well.
fn map_notify_event(event: &notify::Event) -> Option<DiscoveredFile> {
    let paths = &event.paths;

    let (path, kind) = match &event.kind {
        EventKind::Create(CreateKind::Folder) => return None,
        EventKind::Create(_) => (paths.first()?, DiscoveryKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            (paths.first()?, DiscoveryKind::Moved)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            (paths.get(1)?, DiscoveryKind::Moved)
        }
        _ => return None,
    };

    if should_ignore(path) {
        debug!(path = %path.display(), "Ignoring system/temp file");
        return None;
    }

    debug!(path = %path.display(), kind = ?kind, "Mapped watcher event");
    Some(DiscoveredFile::new(path.clone(), kind))
}
