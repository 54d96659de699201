//! SHA-256 content hashing

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use hotdrop_core::domain::ContentHash;
use sha2::{Digest, Sha256};

use crate::PipelineError;

const BUF_SIZE: usize = 64 * 1024;

/// Hashes the file at `path`, streaming it in 64 KiB chunks
pub fn hash_file_blocking(path: &Path) -> Result<ContentHash, PipelineError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentHash::new(format!("{:x}", hasher.finalize()))?)
}

/// Hashes the file on the blocking thread pool
pub async fn hash_file(path: PathBuf) -> Result<ContentHash, PipelineError> {
    tokio::task::spawn_blocking(move || hash_file_blocking(&path))
        .await
        .map_err(|e| PipelineError::IoError(io::Error::new(io::ErrorKind::Other, e)))?
}
