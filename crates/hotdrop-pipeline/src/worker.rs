//! Upload worker - the single consumer of the [`UploadQueue`]
//!
//! ## Attempt sequence
//!
//! ```text
//! pop_ready ──→ file still there? ──no──→ Dropped (release path)
//!                    │ yes
//!               authenticate ──err──┐
//!                    │ ok           │
//!            RateLimiter::acquire   │
//!                    │              │
//!               upload_asset ──err──┤
//!                    │ ok           ▼
//!      mark_uploaded + release   record_failure ──→ Retrying (requeue after backoff)
//!          (Succeeded)                         └──→ Failed   (release path)
//! ```
//!
//! Every terminal outcome is reported once on the optional report channel.

use std::path::PathBuf;
use std::sync::Arc;

use hotdrop_core::domain::{AssetId, ContentHash, JobState, UploadJob};
use hotdrop_core::ports::{IAssetService, RemoteError};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dedup::DedupIndex;
use crate::queue::{Dequeue, RetryPolicy, UploadQueue};
use crate::rate_limit::RateLimiter;

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Uploaded; the asset service returned this identifier
    Uploaded(AssetId),
    /// Gave up after the attempt cap; carries the last error
    Failed(String),
    /// The file disappeared before it could be uploaded
    Dropped,
}

/// Report emitted when a job leaves the queue for good
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub path: PathBuf,
    pub content_hash: ContentHash,
    pub attempts: u32,
    pub outcome: JobOutcome,
}

/// Drains the upload queue one job at a time
pub struct UploadWorker {
    queue: Arc<UploadQueue>,
    dedup: Arc<DedupIndex>,
    limiter: Arc<RateLimiter>,
    service: Arc<dyn IAssetService>,
    policy: RetryPolicy,
    reports: Option<mpsc::UnboundedSender<JobReport>>,
}

impl UploadWorker {
    pub fn new(
        queue: Arc<UploadQueue>,
        dedup: Arc<DedupIndex>,
        limiter: Arc<RateLimiter>,
        service: Arc<dyn IAssetService>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            dedup,
            limiter,
            service,
            policy,
            reports: None,
        }
    }

    /// Sends a [`JobReport`] for every terminal outcome to `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<JobReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// An attempt already under way is completed before the loop exits.
    /// Jobs still resident at that point are dropped and their paths
    /// released.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            retry_secs = self.policy.retry_delay.as_secs(),
            auth_retry_secs = self.policy.auth_retry_delay.as_secs(),
            rate_limit = self.limiter.capacity(),
            "Upload worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let notified = self.queue.notified();
            match self.queue.pop_ready(Instant::now()) {
                Dequeue::Ready(job) => self.attempt(job).await,
                Dequeue::WaitUntil(at) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep_until(at) => {}
                        _ = notified => {}
                    }
                }
                Dequeue::Empty => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = notified => {}
                    }
                }
            }
        }

        let pending = self.queue.drain();
        for job in &pending {
            self.dedup.release(job.file_path());
        }
        info!(dropped = pending.len(), "Upload worker stopped");
    }

    /// Performs one attempt for a checked-out job
    async fn attempt(&self, mut job: UploadJob) {
        let path = job.file_path().to_path_buf();

        let present = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !present {
            warn!(path = %path.display(), "File no longer exists, dropping job");
            self.advance(&mut job, JobState::Dropped);
            self.finish(job, JobOutcome::Dropped);
            return;
        }

        debug!(
            path = %path.display(),
            attempt = job.attempts() + 1,
            max_attempts = job.max_attempts(),
            "Starting upload attempt"
        );

        let result = self.upload(&mut job).await;

        match result {
            Ok(asset_id) => {
                self.advance(&mut job, JobState::Succeeded);
                self.dedup.mark_uploaded(job.content_hash());
                info!(
                    path = %path.display(),
                    asset = %asset_id,
                    container = %job.target(),
                    size = job.file_size(),
                    "Upload succeeded"
                );
                self.finish(job, JobOutcome::Uploaded(asset_id));
            }
            Err(err) => self.handle_failure(job, err),
        }
    }

    async fn upload(&self, job: &mut UploadJob) -> Result<AssetId, RemoteError> {
        let token = self.service.authenticate().await?;

        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            debug!(
                path = %job.file_path().display(),
                waited_ms = waited.as_millis() as u64,
                "Rate limiter delayed upload"
            );
        }

        self.advance(job, JobState::InFlight);
        self.service
            .upload_asset(job.file_path(), job.target(), &token)
            .await
    }

    fn handle_failure(&self, mut job: UploadJob, err: RemoteError) {
        let path = job.file_path().to_path_buf();
        let state = match job.record_failure(err.to_string()) {
            Ok(state) => state,
            Err(domain_err) => {
                error!(path = %path.display(), error = %domain_err, "Cannot record failure");
                JobState::Failed
            }
        };

        if state == JobState::Retrying {
            let delay = self.policy.delay_for(&err);
            warn!(
                path = %path.display(),
                attempt = job.attempts(),
                max_attempts = job.max_attempts(),
                kind = %err.kind,
                error = %err.message,
                retry_in_secs = delay.as_secs(),
                "Upload failed, will retry"
            );
            if let Err(requeue_err) = self.queue.requeue(job.clone(), delay) {
                error!(path = %path.display(), error = %requeue_err, "Cannot requeue job");
                self.finish(job, JobOutcome::Failed(err.to_string()));
            }
            return;
        }

        error!(
            path = %path.display(),
            attempts = job.attempts(),
            error = %err,
            "Upload failed permanently, giving up"
        );
        self.finish(job, JobOutcome::Failed(err.to_string()));
    }

    /// Applies a state transition and mirrors it into the queue snapshot
    fn advance(&self, job: &mut UploadJob, state: JobState) {
        if let Err(err) = job.transition_to(state) {
            warn!(path = %job.file_path().display(), error = %err, "Unexpected job transition");
        }
        self.queue.update(job);
    }

    /// Single exit point for a job leaving the pipeline
    fn finish(&self, job: UploadJob, outcome: JobOutcome) {
        self.dedup.release(job.file_path());
        self.queue.finish(job.file_path());

        if let Some(tx) = &self.reports {
            let report = JobReport {
                path: job.file_path().to_path_buf(),
                content_hash: job.content_hash().clone(),
                attempts: job.attempts(),
                outcome,
            };
            if tx.send(report).is_err() {
                debug!("Report receiver dropped");
            }
        }
    }
}
