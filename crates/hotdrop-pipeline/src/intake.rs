//! Intake - turns discovered files into queued upload jobs
//!
//! ```text
//! mpsc::Receiver<DiscoveredFile>
//!       │ one tracked task per path
//!       ▼
//! StabilityDetector::check ──Vanished──→ (dropped)
//!       │ Stable          ╲──Unsettled──→ checked again
//!       ▼
//! SHA-256 (blocking pool) ──→ DedupIndex::admit ──rejected──→ (dropped)
//!       │ admitted
//!       ▼
//! UploadQueue::enqueue
//! ```
//!
//! Files of a folder-sync plan skip the stability wait: they are already
//! at rest when the tree is walked.
//!
//! Jobs carry the time their file was discovered, so a slow copy that
//! settles late still uploads ahead of files that arrived after it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use hotdrop_core::domain::{ContainerId, ContentHash, DiscoveredFile, UploadJob};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::dedup::DedupIndex;
use crate::folder_sync::FolderSyncPlan;
use crate::hashing::hash_file;
use crate::ignore::should_ignore;
use crate::queue::UploadQueue;
use crate::stability::{StabilityDetector, StabilityOutcome};
use crate::PipelineError;

/// What happened to one discovered or planned file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Enqueued,
    /// Rejected by the dedup index (or already queued)
    Duplicate,
    /// Gone before it could be hashed
    Vanished,
    /// Transient or system file
    Ignored,
    Failed(String),
}

/// Counts for a bulk admission of a folder-sync plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanAdmission {
    pub enqueued: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Consumes discoveries and feeds the upload queue
#[derive(Clone)]
pub struct Intake {
    detector: StabilityDetector,
    dedup: Arc<DedupIndex>,
    queue: Arc<UploadQueue>,
    target: ContainerId,
    max_attempts: u32,
    checking: Arc<Mutex<HashSet<PathBuf>>>,
    tracker: TaskTracker,
}

impl Intake {
    /// Creates an intake that targets `target` for hot-folder files
    pub fn new(
        detector: StabilityDetector,
        dedup: Arc<DedupIndex>,
        queue: Arc<UploadQueue>,
        target: ContainerId,
        max_attempts: u32,
    ) -> Self {
        Self {
            detector,
            dedup,
            queue,
            target,
            max_attempts,
            checking: Arc::new(Mutex::new(HashSet::new())),
            tracker: TaskTracker::new(),
        }
    }

    fn checking(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.checking.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consumes `rx` until it closes or `shutdown` is cancelled
    ///
    /// Returns once every spawned check has finished. On shutdown, running
    /// stability checks are abandoned.
    pub async fn run(&self, mut rx: mpsc::Receiver<DiscoveredFile>, shutdown: CancellationToken) {
        info!(target = %self.target, "Intake starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => match event {
                    Some(discovered) => self.dispatch(discovered, shutdown.clone()),
                    None => {
                        debug!("Discovery channel closed");
                        break;
                    }
                },
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!("Intake stopped");
    }

    /// Spawns a tracked check for one discovery unless its path is busy
    fn dispatch(&self, discovered: DiscoveredFile, shutdown: CancellationToken) {
        let path = discovered.path.clone();
        if !self.checking().insert(path.clone()) {
            debug!(path = %path.display(), "Stability check already running");
            return;
        }

        debug!(path = %path.display(), kind = ?discovered.kind, "New file detected");
        let this = self.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(path = %path.display(), "Stability check cancelled");
                }
                _ = this.ingest(&discovered) => {}
            }
            this.checking().remove(&path);
        });
    }

    /// Runs the full intake sequence for one hot-folder file
    ///
    /// A file still growing when the sample budget runs out is checked
    /// again until it settles or disappears.
    pub async fn ingest(&self, discovered: &DiscoveredFile) -> IngestOutcome {
        let path = discovered.path();
        if should_ignore(path) {
            return IngestOutcome::Ignored;
        }
        if self.dedup.is_active(path) {
            debug!(path = %path.display(), "Already queued");
            return IngestOutcome::Duplicate;
        }

        let mut rounds = 0u32;
        let size = loop {
            match self.detector.check(path).await {
                StabilityOutcome::Stable { size } => break size,
                StabilityOutcome::Vanished => return IngestOutcome::Vanished,
                StabilityOutcome::Unsettled { last_size } => {
                    rounds += 1;
                    debug!(
                        path = %path.display(),
                        last_size,
                        rounds,
                        "File still being written, checking again"
                    );
                }
            }
        };

        let outcome = self
            .admit(path, size, self.target.clone(), discovered.observed_at)
            .await;
        if outcome == IngestOutcome::Enqueued {
            info!(path = %path.display(), size, "Queued for upload");
        }
        outcome
    }

    /// Admits every file of a folder-sync plan into its planned container
    pub async fn admit_plan(&self, plan: &FolderSyncPlan) -> PlanAdmission {
        let mut admission = PlanAdmission::default();

        for planned in &plan.files {
            let size = match tokio::fs::metadata(&planned.path).await {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    warn!(path = %planned.path.display(), error = %err, "Cannot stat planned file");
                    admission.failed += 1;
                    continue;
                }
            };

            match self
                .admit(&planned.path, size, planned.container.clone(), Utc::now())
                .await
            {
                IngestOutcome::Enqueued => admission.enqueued += 1,
                IngestOutcome::Duplicate => admission.duplicates += 1,
                _ => admission.failed += 1,
            }
        }

        info!(
            enqueued = admission.enqueued,
            duplicates = admission.duplicates,
            failed = admission.failed,
            "Folder sync plan admitted"
        );
        admission
    }

    /// Hashes, dedups and enqueues a file at rest
    async fn admit(
        &self,
        path: &Path,
        size: u64,
        target: ContainerId,
        discovered_at: DateTime<Utc>,
    ) -> IngestOutcome {
        let hash = match hash_file(path.to_path_buf()).await {
            Ok(hash) => hash,
            Err(PipelineError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "File vanished before hashing");
                return IngestOutcome::Vanished;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot hash file");
                return IngestOutcome::Failed(err.to_string());
            }
        };

        match self.enqueue(path, size, hash, target, discovered_at) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot queue file");
                IngestOutcome::Failed(err.to_string())
            }
        }
    }

    fn enqueue(
        &self,
        path: &Path,
        size: u64,
        hash: ContentHash,
        target: ContainerId,
        discovered_at: DateTime<Utc>,
    ) -> Result<IngestOutcome, PipelineError> {
        let job = UploadJob::new(path, size, hash.clone(), target, self.max_attempts)?
            .with_discovered_at(discovered_at);

        if !self.dedup.admit(path, &hash) {
            return Ok(IngestOutcome::Duplicate);
        }

        match self.queue.enqueue(job) {
            Ok(true) => Ok(IngestOutcome::Enqueued),
            Ok(false) => {
                self.dedup.release(path);
                Ok(IngestOutcome::Duplicate)
            }
            Err(err) => {
                self.dedup.release(path);
                Err(err)
            }
        }
    }
}
