//! Filesystem helpers for download destinations

use crate::error::Result;
use std::path::Path;

/// Read-only view of the files the engine writes
///
/// The status mapper asks for on-disk sizes through this trait, so tests can
/// answer from memory instead of touching the disk.
pub trait FileProbe: Send + Sync {
    /// Size of the file at `path`, or `None` when it does not exist
    fn file_size(&self, path: &Path) -> Option<u64>;
}

/// [`FileProbe`] backed by the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }
}

/// Remove a leftover file at `path`
///
/// Returns `true` when a file was removed, `false` when there was nothing to remove.
pub async fn remove_stale_file(path: &Path) -> Result<bool> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(false);
    }
    tokio::fs::remove_file(path).await?;
    Ok(true)
}

/// Extract the final path component of `name`
///
/// Returns `None` when `name` has no usable file name (empty, `..`, or a bare root).
pub fn final_component(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
