//! Transfer of file bytes to presigned upload URLs
//!
//! A registered upload returns one URL per part. Parts that carry a `size`
//! receive that many bytes in order; a part without a size receives the
//! remainder of the file. The URLs are presigned, so no bearer token is
//! attached.
//!
//! Each part is streamed from its own file handle with an explicit
//! `Content-Length`, so memory use does not grow with the part size.

use std::io::SeekFrom;
use std::path::Path;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::client::UploadUrl;
use crate::{check_status, RemoteApiError};

const ACL_HEADER: &str = "x-amz-acl";
const ACL_PRIVATE: &str = "private";

/// Content type sent with every part
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Computes the byte length of each part
///
/// # Errors
///
/// Returns [`RemoteApiError::InvalidResponse`] if there are no parts or the
/// declared sizes do not add up to `file_size`.
pub fn part_sizes(parts: &[UploadUrl], file_size: u64) -> Result<Vec<u64>, RemoteApiError> {
    if parts.is_empty() {
        return Err(RemoteApiError::InvalidResponse(
            "upload response contained no upload_urls".to_string(),
        ));
    }

    let mut remaining = file_size;
    let mut sizes = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let is_last = i + 1 == parts.len();
        let size = match part.size {
            Some(size) if size <= remaining => size,
            Some(size) => {
                return Err(RemoteApiError::InvalidResponse(format!(
                    "part {} declares {} bytes but only {} remain",
                    i, size, remaining
                )))
            }
            None if is_last => remaining,
            None => {
                return Err(RemoteApiError::InvalidResponse(format!(
                    "part {} of {} has no size",
                    i,
                    parts.len()
                )))
            }
        };
        remaining -= size;
        sizes.push(size);
    }

    if remaining != 0 {
        return Err(RemoteApiError::InvalidResponse(format!(
            "upload parts leave {} bytes unassigned",
            remaining
        )));
    }
    Ok(sizes)
}

/// PUTs the contents of `path` to the given parts in order
pub async fn put_parts(
    http: &Client,
    path: &Path,
    parts: &[UploadUrl],
    file_size: u64,
) -> Result<(), RemoteApiError> {
    let sizes = part_sizes(parts, file_size)?;

    let mut offset = 0;
    for (index, (part, size)) in parts.iter().zip(sizes).enumerate() {
        let body = part_body(path, index, offset, size).await?;

        debug!(part = index, offset, bytes = size, "Uploading part");
        let response = http
            .put(&part.url)
            .header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE)
            .header(CONTENT_LENGTH, size)
            .header(ACL_HEADER, ACL_PRIVATE)
            .body(body)
            .send()
            .await?;
        check_status(response).await?;
        offset += size;
    }

    Ok(())
}

/// Streams `size` bytes of `path` starting at `offset`
async fn part_body(
    path: &Path,
    index: usize,
    offset: u64,
    size: u64,
) -> Result<Body, RemoteApiError> {
    let mut file = tokio::fs::File::open(path).await?;
    if file.metadata().await?.len() < offset + size {
        return Err(RemoteApiError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("file shrank while uploading part {}", index),
        )));
    }
    file.seek(SeekFrom::Start(offset)).await?;
    Ok(Body::wrap_stream(ReaderStream::new(file.take(size))))
}
