//! File stability detection
//!
//! A file that just appeared in the hot folder is usually still being
//! written by a camera card reader, an NLE export or a network copy. The
//! [`StabilityDetector`] samples the file size at a fixed interval and
//! declares the file stable the first time two consecutive samples agree.
//!
//! ```text
//! t=0     t=1s    t=2s    t=3s
//! 120MB → 480MB → 910MB → 910MB   ⇒ Stable { size: 910MB }
//! 120MB → (gone)                  ⇒ Vanished
//! 1 → 2 → 3 → ... (budget spent)  ⇒ Unsettled
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotdrop_core::config::StabilityConfig;
use tracing::debug;

/// Result of a stability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityOutcome {
    /// Two consecutive samples reported `size`
    Stable { size: u64 },
    /// The file disappeared or could not be read
    Vanished,
    /// The sample budget ran out while the size was still changing
    Unsettled { last_size: u64 },
}

/// Source of file size samples
#[async_trait]
pub trait SizeProbe: Send + Sync {
    /// Returns the current size of the regular file at `path`
    async fn size(&self, path: &Path) -> io::Result<u64>;
}

/// [`SizeProbe`] backed by filesystem metadata
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSizeProbe;

#[async_trait]
impl SizeProbe for FsSizeProbe {
    async fn size(&self, path: &Path) -> io::Result<u64> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(metadata.len())
    }
}

/// Decides when a newly observed file has finished being written
#[derive(Clone)]
pub struct StabilityDetector {
    interval: Duration,
    max_samples: u32,
    probe: Arc<dyn SizeProbe>,
}

impl StabilityDetector {
    /// Creates a detector sampling every `interval`, at most `max_samples` times
    ///
    /// At least two samples are always taken, since one reading can never
    /// prove stability.
    pub fn new(interval: Duration, max_samples: u32) -> Self {
        Self::with_probe(interval, max_samples, Arc::new(FsSizeProbe))
    }

    /// Creates a detector with a custom size source
    pub fn with_probe(interval: Duration, max_samples: u32, probe: Arc<dyn SizeProbe>) -> Self {
        Self {
            interval,
            max_samples: max_samples.max(2),
            probe,
        }
    }

    pub fn from_config(config: &StabilityConfig) -> Self {
        Self::new(Duration::from_millis(config.interval_ms), config.max_samples)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_samples(&self) -> u32 {
        self.max_samples
    }

    /// Samples the size of `path` until two consecutive readings agree
    ///
    /// The first sample is taken immediately. Cancellation is the caller's
    /// concern: dropping the future between samples is safe.
    pub async fn check(&self, path: &Path) -> StabilityOutcome {
        let mut previous: Option<u64> = None;

        for sample in 0..self.max_samples {
            if sample > 0 {
                tokio::time::sleep(self.interval).await;
            }

            let size = match self.probe.size(path).await {
                Ok(size) => size,
                Err(err) => {
                    debug!(
                        path = %path.display(),
                        error = %err,
                        sample,
                        "File vanished during stability check"
                    );
                    return StabilityOutcome::Vanished;
                }
            };

            if previous == Some(size) {
                debug!(path = %path.display(), size, samples = sample + 1, "File is stable");
                return StabilityOutcome::Stable { size };
            }
            previous = Some(size);
        }

        StabilityOutcome::Unsettled {
            last_size: previous.unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for StabilityDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityDetector")
            .field("interval", &self.interval)
            .field("max_samples", &self.max_samples)
            .finish_non_exhaustive()
    }
}
