//! Upload jobs and their lifecycle
//!
//! An [`UploadJob`] is created by the intake stage once a file is stable
//! and admitted by the dedup index. From then on it is owned by the upload
//! queue, and only the queue's single worker mutates it.
//!
//! ```text
//! Queued ──→ Waiting ──→ InFlight ──→ Succeeded
//!   ▲          │  │          │
//!   │          │  │          ├──→ Retrying ──→ Queued
//!   │          │  │          └──→ Failed
//!   │          │  └──→ Retrying / Failed   (token could not be obtained)
//!   └──────────┴──→ Dropped                (file vanished)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{ContainerId, ContentHash};

/// Default number of upload attempts before a job is given up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ============================================================================
// JobState
// ============================================================================

/// Lifecycle state of an upload job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Resident in the queue, stability or retry window not yet elapsed
    #[default]
    Queued,
    /// Selected by the worker, waiting for a token and a rate-limit permit
    Waiting,
    /// Upload call in progress
    InFlight,
    /// Uploaded; terminal
    Succeeded,
    /// Failed with attempts left; re-queued after the backoff
    Retrying,
    /// Attempt cap reached; terminal
    Failed,
    /// File disappeared before it could be uploaded; terminal
    Dropped,
}

impl JobState {
    /// Returns true if the job will never be attempted again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Dropped
        )
    }

    /// Returns the state name
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Queued => "Queued",
            JobState::Waiting => "Waiting",
            JobState::InFlight => "InFlight",
            JobState::Succeeded => "Succeeded",
            JobState::Retrying => "Retrying",
            JobState::Failed => "Failed",
            JobState::Dropped => "Dropped",
        }
    }

    /// Checks whether moving from `self` to `target` is a legal transition
    pub fn can_transition_to(&self, target: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, target),
            (Queued, Waiting)
                | (Queued, Dropped)
                | (Waiting, InFlight)
                | (Waiting, Retrying)
                | (Waiting, Failed)
                | (Waiting, Dropped)
                | (InFlight, Succeeded)
                | (InFlight, Retrying)
                | (InFlight, Failed)
                | (Retrying, Queued)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// UploadJob
// ============================================================================

/// A file waiting to be forwarded to the asset service
///
/// The absolute `file_path` is the job's unique key inside the queue and
/// `content_hash` is its deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    file_path: PathBuf,
    file_name: String,
    file_size: u64,
    content_hash: ContentHash,
    target: ContainerId,
    created_at: DateTime<Utc>,
    attempts: u32,
    max_attempts: u32,
    state: JobState,
    last_error: Option<String>,
}

impl UploadJob {
    /// Creates a new job in the `Queued` state
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPath`] if `file_path` is relative or has
    /// no file name component, and [`DomainError::InvalidState`] if
    /// `max_attempts` is zero.
    pub fn new(
        file_path: impl Into<PathBuf>,
        file_size: u64,
        content_hash: ContentHash,
        target: ContainerId,
        max_attempts: u32,
    ) -> Result<Self, DomainError> {
        let file_path = file_path.into();
        if !file_path.is_absolute() {
            return Err(DomainError::InvalidPath(file_path.display().to_string()));
        }
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DomainError::InvalidPath(file_path.display().to_string()))?;
        if max_attempts == 0 {
            return Err(DomainError::InvalidState {
                from: "new".to_string(),
                to: "max_attempts = 0".to_string(),
            });
        }

        Ok(Self {
            file_path,
            file_name,
            file_size,
            content_hash,
            target,
            created_at: Utc::now(),
            attempts: 0,
            max_attempts,
            state: JobState::Queued,
            last_error: None,
        })
    }

    /// Stamps the job with the time its file was first discovered
    ///
    /// Queue order follows this timestamp, so a file that took longer to
    /// settle keeps its place ahead of files discovered after it.
    pub fn with_discovered_at(mut self, discovered_at: DateTime<Utc>) -> Self {
        self.created_at = discovered_at;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn target(&self) -> &ContainerId {
        &self.target
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of failed attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Message of the most recent failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Moves the job to `target`, rejecting illegal transitions
    pub fn transition_to(&mut self, target: JobState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                from: self.state.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// Records a failed attempt
    ///
    /// Increments `attempts` and moves the job to `Retrying` if attempts
    /// remain, or to `Failed` once `attempts >= max_attempts`. Returns the
    /// new state.
    pub fn record_failure(&mut self, error: impl Into<String>) -> Result<JobState, DomainError> {
        self.attempts += 1;
        self.last_error = Some(error.into());
        let next = if self.attempts >= self.max_attempts {
            JobState::Failed
        } else {
            JobState::Retrying
        };
        self.transition_to(next)?;
        Ok(next)
    }
}
