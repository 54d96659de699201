//! Remote source port for polled origins
//!
//! A polling watcher lists a remote location on a fixed interval and
//! downloads new entries into a local staging directory. Anything that can
//! list named entries and copy one of them to a local path can serve as a
//! source.

use std::path::Path;

use chrono::{DateTime, Utc};

/// One entry of a remote listing
///
/// The `(name, size, modified)` tuple identifies a version of an entry: a
/// change in any of them makes the entry "new" again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFileInfo {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// Port trait for a polled source of files
#[async_trait::async_trait]
pub trait IRemoteSource: Send + Sync {
    /// Lists the entries currently present at the source
    async fn list(&self) -> anyhow::Result<Vec<RemoteFileInfo>>;

    /// Copies the entry `name` to `dest`, returning the number of bytes written
    async fn fetch(&self, name: &str, dest: &Path) -> anyhow::Result<u64>;

    /// Human-readable description for log lines
    fn describe(&self) -> String;
}
