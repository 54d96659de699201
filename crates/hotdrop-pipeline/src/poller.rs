//! Polling source watcher
//!
//! For origins that cannot push events (an FTP drop, a mounted share), the
//! [`PollingWatcher`] lists the source every `interval`, diffs the listing
//! against the previous one and stages new files locally before handing
//! them to the intake.
//!
//! ```text
//! every interval:
//!   list() ──→ current − seen ──→ fetch(name, staging/name.part)
//!                                     │ ok: rename to staging/name
//!                                     ▼
//!                        DiscoveredFile(staging/name) ──→ Intake
//! ```
//!
//! An entry is identified by its `(name, size, modified)` tuple, so a file
//! that is replaced on the source is fetched again. A failed fetch is left
//! out of the `seen` set and retried on the next cycle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hotdrop_core::domain::{DiscoveredFile, DiscoveryKind};
use hotdrop_core::ports::{IRemoteSource, RemoteFileInfo};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ignore::is_ignored_name;

/// Stages new files from an [`IRemoteSource`] on a fixed interval
pub struct PollingWatcher {
    source: Arc<dyn IRemoteSource>,
    staging_dir: PathBuf,
    interval: Duration,
    tx: mpsc::Sender<DiscoveredFile>,
    seen: HashSet<RemoteFileInfo>,
}

impl PollingWatcher {
    pub fn new(
        source: Arc<dyn IRemoteSource>,
        staging_dir: impl Into<PathBuf>,
        interval: Duration,
        tx: mpsc::Sender<DiscoveredFile>,
    ) -> Self {
        Self {
            source,
            staging_dir: staging_dir.into(),
            interval,
            tx,
            seen: HashSet::new(),
        }
    }

    /// Polls until `shutdown` is cancelled or the receiver goes away
    ///
    /// The first poll happens immediately.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            source = %self.source.describe(),
            staging = %self.staging_dir.display(),
            interval_secs = self.interval.as_secs(),
            "Polling watcher starting"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                    if self.tx.is_closed() {
                        info!("Discovery receiver closed");
                        break;
                    }
                }
            }
        }

        info!("Polling watcher stopped");
    }

    /// Runs one list/diff/fetch cycle and returns the number of files staged
    pub async fn poll_once(&mut self) -> usize {
        let listing = match self.source.list().await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(source = %self.source.describe(), error = %err, "Listing failed, retrying next interval");
                return 0;
            }
        };

        if let Err(err) = tokio::fs::create_dir_all(&self.staging_dir).await {
            warn!(path = %self.staging_dir.display(), error = %err, "Cannot create staging directory");
            return 0;
        }

        let mut current: HashSet<RemoteFileInfo> = listing.into_iter().collect();
        let mut fresh: Vec<RemoteFileInfo> = current
            .iter()
            .filter(|info| !self.seen.contains(*info))
            .filter(|info| !info.is_dir && !is_ignored_name(&info.name))
            .cloned()
            .collect();
        fresh.sort_by(|a, b| a.name.cmp(&b.name));

        if fresh.is_empty() {
            debug!(source = %self.source.describe(), "No new files");
        } else {
            info!(count = fresh.len(), source = %self.source.describe(), "Found new files");
        }

        let mut staged = 0;
        for info in fresh {
            match self.stage(&info).await {
                Ok(path) => {
                    staged += 1;
                    if self
                        .tx
                        .send(DiscoveredFile::new(path, DiscoveryKind::Created))
                        .await
                        .is_err()
                    {
                        warn!("Discovery receiver dropped");
                        break;
                    }
                }
                Err(err) => {
                    warn!(name = %info.name, error = %err, "Download failed, will retry next interval");
                    current.remove(&info);
                }
            }
        }

        self.seen = current;
        staged
    }

    /// Downloads one entry under a `.part` name, then renames it into place
    async fn stage(&self, info: &RemoteFileInfo) -> anyhow::Result<PathBuf> {
        let file_name = Path::new(&info.name)
            .file_name()
            .filter(|n| n.to_str() == Some(info.name.as_str()))
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name: {:?}", info.name))?;

        let target = self.staging_dir.join(file_name);
        let partial = self.staging_dir.join(format!("{}.part", info.name));

        debug!(name = %info.name, size = info.size, "Downloading");
        let bytes = match self.source.fetch(&info.name, &partial).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };
        tokio::fs::rename(&partial, &target).await?;

        info!(name = %info.name, bytes, path = %target.display(), "Staged file");
        Ok(target)
    }
}
