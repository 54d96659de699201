//! Transient and system file filter
//!
//! Finder metadata, partial downloads, editor lock files and sync-tool
//! scratch files show up in hot folders constantly and must never be
//! uploaded. Matching is done on the lowercased file name only.

use std::path::Path;

/// Names ignored on exact (case-insensitive) match
const EXACT_NAMES: &[&str] = &[
    ".ds_store",
    "thumbs.db",
    "desktop.ini",
    ".localized",
    ".fseventsd",
    ".spotlight-v100",
    ".trashes",
    ".documentrevisions-v100",
];

const PREFIXES: &[&str] = &["._", ".fuse_hidden", ".#", ".tmp", ".dat.nosync", ".syncthing"];

const SUFFIXES: &[&str] = &[
    "~",
    ".tmp",
    ".temp",
    ".synctmp",
    ".part",
    ".crdownload",
    ".download",
    ".!ut",
];

/// Returns true if the file name is a transient or system artefact
///
/// Paths without a file name component (e.g. `/` or `..`) are ignored too.
pub fn should_ignore(path: &Path) -> bool {
    match path.file_name() {
        Some(name) => is_ignored_name(&name.to_string_lossy()),
        None => true,
    }
}

/// Name-only variant of [`should_ignore`], used for remote listings
pub fn is_ignored_name(name: &str) -> bool {
    let name = name.to_lowercase();

    if EXACT_NAMES.contains(&name.as_str()) {
        return true;
    }
    if PREFIXES.iter().any(|p| name.starts_with(p)) {
        return true;
    }
    if SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return true;
    }

    // Emacs auto-save files: #name#
    name.len() >= 2 && name.starts_with('#') && name.ends_with('#')
}
