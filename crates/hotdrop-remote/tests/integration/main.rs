//! Integration tests for hotdrop-remote
//!
//! Uses wiremock to stand in for both the identity endpoint and the asset
//! API, and drives them through the `IAssetService` port. The FTP source
//! runs against a scripted in-process server.

mod common;

mod test_auth;
mod test_folders;
mod test_ftp;
mod test_upload;
