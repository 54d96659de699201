//! Directory-backed remote source
//!
//! Serves a locally mounted drop location (an FTP or SMB share mounted with
//! curlftpfs, rclone, autofs...) through the [`IRemoteSource`] port, so the
//! polling watcher can stage files from it without knowing the protocol.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use hotdrop_core::ports::{IRemoteSource, RemoteFileInfo};

/// [`IRemoteSource`] over a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `name` to a direct child of the root
    fn child(&self, name: &str) -> Result<PathBuf> {
        if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            bail!("Invalid entry name: {name:?}");
        }
        Ok(self.root.join(name))
    }
}

#[async_trait::async_trait]
impl IRemoteSource for DirectorySource {
    async fn list(&self) -> Result<Vec<RemoteFileInfo>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to list {}", self.root.display()))?;

        let mut listing = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            listing.push(RemoteFileInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                is_dir: metadata.is_dir(),
            });
        }
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    async fn fetch(&self, name: &str, dest: &Path) -> Result<u64> {
        let src = self.child(name)?;
        tokio::fs::copy(&src, dest)
            .await
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}
