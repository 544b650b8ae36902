//! Volume backed by a mounted directory tree.
//!
//! Covers devices the OS already exposes as a path: MTP phones mounted through gvfs or kio,
//! camera cards, or a plain folder used as a stand-in device.

use super::{DirEntry, Volume, VolumeError, sort_entries, write_then_rename};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A volume backed by the local file system, rooted at a configurable path.
///
/// For example:
/// - Root "/run/user/1000/gvfs/mtp:host=Google_Pixel_8/Internal shared storage"
/// - Root "/media/alice/EOS_DIGITAL"
pub struct LocalVolume {
    name: String,
    root: PathBuf,
}

impl LocalVolume {
    /// Creates a new local volume with the given name and root path.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Resolves a path relative to this volume's root to an absolute path.
    ///
    /// Empty paths or "." resolve to the root itself. Absolute paths are treated as relative
    /// to the volume root (the leading "/" is stripped) unless they already start with it.
    pub(super) fn resolve(&self, path: &Path) -> PathBuf {
        if path.as_os_str().is_empty() || path == Path::new(".") {
            self.root.clone()
        } else if path.is_absolute() {
            if path.starts_with(&self.root) {
                path.to_path_buf()
            } else {
                let relative = path.strip_prefix("/").unwrap_or(path);
                self.root.join(relative)
            }
        } else {
            self.root.join(path)
        }
    }
}

impl Volume for LocalVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        fs::metadata(self.resolve(path)).is_ok()
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, VolumeError> {
        let abs_path = self.resolve(path);
        let mut entries = Vec::new();

        for entry in fs::read_dir(&abs_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a link to a photo counts as a photo
            let metadata = match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) => {
                    debug!("LocalVolume::list_entries: skipping {}: {}", name, e);
                    continue;
                }
            };
            entries.push(DirEntry {
                name,
                is_directory: metadata.is_dir(),
                size: if metadata.is_dir() { None } else { Some(metadata.len()) },
            });
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    fn count_media(
        &self,
        path: &Path,
        is_media: &dyn Fn(&DirEntry) -> bool,
        limit: usize,
    ) -> Result<usize, VolumeError> {
        let abs_path = self.resolve(path);
        let mut count = 0;

        for entry in fs::read_dir(&abs_path)? {
            if count >= limit {
                break;
            }
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    debug!("LocalVolume::count_media: skipping {}: {}", name, e);
                    continue;
                }
            };
            // Only links need a stat, to see what they point at
            let is_directory = if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(m) => m.is_dir(),
                    Err(e) => {
                        debug!("LocalVolume::count_media: skipping {}: {}", name, e);
                        continue;
                    }
                }
            } else {
                file_type.is_dir()
            };

            let candidate = DirEntry {
                name,
                is_directory,
                size: None,
            };
            if is_media(&candidate) {
                count += 1;
            }
        }

        Ok(count)
    }

    fn supports_export(&self) -> bool {
        true
    }

    fn copy_file(&self, path: &Path, destination_dir: &Path) -> Result<PathBuf, VolumeError> {
        let source = self.resolve(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| VolumeError::NotFound {
                path: path.display().to_string(),
            })?;

        write_then_rename(destination_dir, &name, |temp| fs::copy(&source, temp).map(|_| ()))
    }
}
