//! Ordered upload queue
//!
//! The queue is an explicit map from file path to [`UploadJob`] plus an
//! ordering index on `(created_at, sequence)`. A job becomes eligible once
//! its "not before" instant has passed: initially the end of the stability
//! window measured from `created_at`, after a failure the end of the retry
//! backoff. The consumer always takes the oldest eligible job, so a retried
//! job keeps its original position.
//!
//! ```text
//!            enqueue                  pop_ready
//! Intake ──────────────→ [ map + order index ] ──────────→ UploadWorker
//!                               ▲                              │
//!                               └───────── requeue ────────────┘
//!                                      (Retrying → Queued)
//! ```
//!
//! The queue itself never performs I/O. Exactly one worker consumes it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hotdrop_core::config::UploadConfig;
use hotdrop_core::domain::{DomainError, JobState, UploadJob};
use hotdrop_core::ports::{RemoteError, RemoteErrorKind};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::PipelineError;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Fixed backoff applied between failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after an ordinary failure
    pub retry_delay: Duration,
    /// Delay after an authentication failure
    pub auth_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(30),
            auth_retry_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            auth_retry_delay: Duration::from_secs(config.auth_retry_delay_secs),
        }
    }

    /// Returns the backoff for a failed attempt
    pub fn delay_for(&self, error: &RemoteError) -> Duration {
        match error.kind {
            RemoteErrorKind::Auth => self.auth_retry_delay,
            _ => self.retry_delay,
        }
    }
}

// ============================================================================
// UploadQueue
// ============================================================================

/// Position of a job in the ordering index
type OrderKey = (DateTime<Utc>, u64);

#[derive(Debug)]
struct Resident {
    job: UploadJob,
    key: OrderKey,
    not_before: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: HashMap<PathBuf, Resident>,
    order: BTreeMap<OrderKey, PathBuf>,
    /// The job currently held by the worker, with its original position
    checked_out: Option<(OrderKey, UploadJob)>,
    next_seq: u64,
}

/// What the consumer should do next
#[derive(Debug)]
pub enum Dequeue {
    /// The oldest eligible job, now in the `Waiting` state
    Ready(UploadJob),
    /// Nothing is eligible yet; the earliest job becomes eligible at this instant
    WaitUntil(Instant),
    /// No resident jobs
    Empty,
}

/// Ordered, mutable work queue shared by the intake and the upload worker
#[derive(Debug)]
pub struct UploadQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    stable_delay: Duration,
}

impl UploadQueue {
    /// Creates a queue whose jobs wait `stable_delay` after `created_at`
    /// before their first attempt
    pub fn new(stable_delay: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            stable_delay,
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stable_delay(&self) -> Duration {
        self.stable_delay
    }

    /// Adds a new job and wakes the worker
    ///
    /// Returns `Ok(false)` without changes if the path already has a
    /// resident or checked-out job.
    ///
    /// # Errors
    /// Returns [`PipelineError::DomainError`] if the job is not `Queued`.
    pub fn enqueue(&self, job: UploadJob) -> Result<bool, PipelineError> {
        if job.state() != JobState::Queued {
            return Err(PipelineError::DomainError(DomainError::InvalidState {
                from: job.state().name().to_string(),
                to: JobState::Queued.name().to_string(),
            }));
        }

        // The stability window runs from created_at, not from now.
        let age = (Utc::now() - job.created_at())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let not_before = Instant::now() + self.stable_delay.saturating_sub(age);

        {
            let mut state = self.state();
            let path = job.file_path().to_path_buf();
            let checked_out = state
                .checked_out
                .as_ref()
                .is_some_and(|(_, j)| j.file_path() == path);
            if checked_out || state.jobs.contains_key(&path) {
                warn!(path = %path.display(), "Job already queued for this path");
                return Ok(false);
            }

            let key = (job.created_at(), state.next_seq);
            state.next_seq += 1;
            state.order.insert(key, path.clone());
            debug!(
                path = %path.display(),
                size = job.file_size(),
                container = %job.target(),
                queued = state.jobs.len() + 1,
                "Job enqueued"
            );
            state.jobs.insert(
                path,
                Resident {
                    job,
                    key,
                    not_before,
                },
            );
        }

        self.notify.notify_one();
        Ok(true)
    }

    /// Checks out the oldest job whose wait window has elapsed at `now`
    ///
    /// The job leaves the resident set and moves to `Waiting`. It stays
    /// visible through [`snapshot`](Self::snapshot) until the worker calls
    /// [`requeue`](Self::requeue) or [`finish`](Self::finish).
    pub fn pop_ready(&self, now: Instant) -> Dequeue {
        let mut state = self.state();

        let mut earliest: Option<Instant> = None;
        let mut ready: Option<(OrderKey, PathBuf)> = None;
        for (key, path) in &state.order {
            let Some(resident) = state.jobs.get(path) else {
                continue;
            };
            if resident.not_before <= now {
                ready = Some((*key, path.clone()));
                break;
            }
            earliest = Some(match earliest {
                Some(at) => at.min(resident.not_before),
                None => resident.not_before,
            });
        }

        let Some((key, path)) = ready else {
            return match earliest {
                Some(at) => Dequeue::WaitUntil(at),
                None => Dequeue::Empty,
            };
        };

        state.order.remove(&key);
        let Some(resident) = state.jobs.remove(&path) else {
            return Dequeue::Empty;
        };
        let mut job = resident.job;
        if let Err(err) = job.transition_to(JobState::Waiting) {
            warn!(path = %path.display(), error = %err, "Unexpected job state at dequeue");
        }
        state.checked_out = Some((key, job.clone()));
        Dequeue::Ready(job)
    }

    /// Mirrors the worker's copy of the checked-out job for snapshots
    pub fn update(&self, job: &UploadJob) {
        let mut state = self.state();
        if let Some((_, current)) = state.checked_out.as_mut() {
            if current.file_path() == job.file_path() {
                *current = job.clone();
            }
        }
    }

    /// Returns a `Retrying` job to the queue at its original position
    ///
    /// It becomes eligible again after `delay`.
    pub fn requeue(&self, mut job: UploadJob, delay: Duration) -> Result<(), PipelineError> {
        job.transition_to(JobState::Queued)?;
        {
            let mut state = self.state();
            let key = match state.checked_out.take() {
                Some((key, current)) if current.file_path() == job.file_path() => key,
                other => {
                    state.checked_out = other;
                    let key = (job.created_at(), state.next_seq);
                    state.next_seq += 1;
                    key
                }
            };
            let path = job.file_path().to_path_buf();
            state.order.insert(key, path.clone());
            state.jobs.insert(
                path,
                Resident {
                    job,
                    key,
                    not_before: Instant::now() + delay,
                },
            );
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Forgets the checked-out job after it reached a terminal state
    pub fn finish(&self, path: &Path) {
        let mut state = self.state();
        if state
            .checked_out
            .as_ref()
            .is_some_and(|(_, job)| job.file_path() == path)
        {
            state.checked_out = None;
        }
    }

    /// Removes and returns every resident job, oldest first
    pub fn drain(&self) -> Vec<UploadJob> {
        let mut state = self.state();
        let order = std::mem::take(&mut state.order);
        let mut jobs = std::mem::take(&mut state.jobs);
        order
            .into_values()
            .filter_map(|path| jobs.remove(&path).map(|r| r.job))
            .collect()
    }

    /// Lists resident and checked-out jobs in queue order
    pub fn snapshot(&self) -> Vec<UploadJob> {
        let state = self.state();
        let mut entries: Vec<(OrderKey, UploadJob)> = state
            .jobs
            .values()
            .map(|r| (r.key, r.job.clone()))
            .collect();
        if let Some((key, job)) = &state.checked_out {
            entries.push((*key, job.clone()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, job)| job).collect()
    }

    /// Returns true if `path` has a resident or checked-out job
    pub fn contains(&self, path: &Path) -> bool {
        let state = self.state();
        state.jobs.contains_key(path)
            || state
                .checked_out
                .as_ref()
                .is_some_and(|(_, job)| job.file_path() == path)
    }

    /// Number of resident jobs (not counting a checked-out one)
    pub fn len(&self) -> usize {
        self.state().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Future completing on the next enqueue or requeue
    ///
    /// A notification issued while nobody waits is stored, so an enqueue
    /// that races with the worker going to sleep is not lost.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }
}
