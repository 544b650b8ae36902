//! Volume trait for abstracting device storage access.
//!
//! A `Volume` is one storage root of an attached device (for example the internal storage of a
//! phone mounted over MTP). The scanner probes it for known folders and the import worker lists
//! and copies files out of it. Backends: `LocalVolume` for mounted roots, `InMemoryVolume` for
//! tests.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A single entry of a device directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    /// File or directory name (no path).
    pub name: String,
    pub is_directory: bool,
    /// Size in bytes, if the backend reports it. Always `None` for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DirEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            size: Some(size),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            size: None,
        }
    }
}

/// Error type for volume operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeError {
    /// Path not found
    NotFound { path: String },
    /// Permission denied
    PermissionDenied { path: String },
    /// Device went away mid-operation
    Disconnected { message: String },
    /// Operation not supported by this volume type
    NotSupported,
    /// Generic I/O error
    IoError { message: String },
}

impl std::fmt::Display for VolumeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "Path not found: {}", path),
            Self::PermissionDenied { path } => write!(f, "Permission denied: {}", path),
            Self::Disconnected { message } => write!(f, "Device disconnected: {}", message),
            Self::NotSupported => write!(f, "Operation not supported"),
            Self::IoError { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for VolumeError {}

impl From<io::Error> for VolumeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path: err.to_string() },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: err.to_string() },
            _ => Self::IoError {
                message: err.to_string(),
            },
        }
    }
}

/// Trait for device storage access.
///
/// All path parameters are relative to the volume root. Calls may block for a long time (device
/// I/O), so they are made from background contexts, except for the bounded probes of the
/// folder scanner.
pub trait Volume: Send + Sync {
    /// Returns the display name for this volume (e.g., "Pixel 8 / Internal shared storage").
    fn name(&self) -> &str;

    /// Returns the root path of this volume.
    fn root(&self) -> &Path;

    // ========================================
    // Required: All volumes must implement
    // ========================================

    /// Checks if a path exists. Any failure to find out counts as "doesn't exist".
    fn exists(&self, path: &Path) -> bool;

    /// Lists the direct children of a directory, in the backend's enumeration order.
    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, VolumeError>;

    /// Counts the children of `path` that `is_media` accepts, stopping once `limit` is reached.
    ///
    /// Backends that can enumerate lazily should override this so a huge folder costs no more
    /// than `limit` matches. Entries handed to `is_media` may have no size.
    fn count_media(
        &self,
        path: &Path,
        is_media: &dyn Fn(&DirEntry) -> bool,
        limit: usize,
    ) -> Result<usize, VolumeError> {
        let entries = self.list_entries(path)?;
        Ok(entries.iter().filter(|&entry| is_media(entry)).take(limit).count())
    }

    // ========================================
    // Copy/Export: Optional, default not supported
    // ========================================

    /// Returns whether files can be copied out of this volume.
    fn supports_export(&self) -> bool {
        false
    }

    /// Copies one file out of the volume into a local directory, keeping its name.
    /// Returns the local path of the copy.
    ///
    /// The copy must never be visible under its final name before it's complete.
    fn copy_file(&self, path: &Path, destination_dir: &Path) -> Result<PathBuf, VolumeError> {
        let _ = (path, destination_dir);
        Err(VolumeError::NotSupported)
    }
}

/// Writes a file into `destination_dir` under a temporary name, then renames it to `name`.
///
/// `write` receives the temporary path. If it fails, the temporary file is removed and the
/// final name is never created.
pub(crate) fn write_then_rename(
    destination_dir: &Path,
    name: &str,
    write: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<PathBuf, VolumeError> {
    let final_path = destination_dir.join(name);
    let temp_path = destination_dir.join(format!(".{}.part", name));

    if let Err(e) = write(&temp_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, &final_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(final_path)
}

/// Orders a listing like a file manager does: directories first, then natural name order
/// ("IMG_2" before "IMG_10").
pub(crate) fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| alphanumeric_sort::compare_str(&a.name, &b.name))
    });
}

// Implementations
mod in_memory;
mod local;

pub use in_memory::InMemoryVolume;
pub use local::LocalVolume;

#[cfg(test)]
mod in_memory_test;
