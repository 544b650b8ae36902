//! Media file classification by name.

use super::DirEntry;
use std::collections::HashSet;
use std::path::Path;

/// Camera RAW and HEIF formats that MIME guessing doesn't reliably know about.
const EXTRA_IMAGE_EXTENSIONS: &[&str] = &[
    "heic", "heif", "avif", "dng", "cr2", "cr3", "nef", "nrw", "arw", "srw", "raf", "orf", "rw2", "pef",
];

/// Decides whether a directory entry is a photo or video worth importing.
///
/// A name counts as media if its guessed MIME type is `image/*` or `video/*`, or if its
/// extension is in the RAW/HEIF list or the configured extras. Dotfiles never count (Android
/// keeps `.nomedia` markers and `.trashed-*` files next to real photos).
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    extra_extensions: HashSet<String>,
}

impl MediaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds extensions (without the dot, any case) that should also count as media.
    pub fn with_extra_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_extensions.extend(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase()),
        );
        self
    }

    pub fn is_media_file(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        let Some(extension) = Path::new(name).extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            return false;
        };
        if EXTRA_IMAGE_EXTENSIONS.contains(&extension.as_str()) || self.extra_extensions.contains(&extension) {
            return true;
        }
        mime_guess::from_ext(&extension)
            .first_raw()
            .is_some_and(|mime| mime.starts_with("image/") || mime.starts_with("video/"))
    }

    /// Like `is_media_file`, but directories never count.
    pub fn is_media_entry(&self, entry: &DirEntry) -> bool {
        !entry.is_directory && self.is_media_file(&entry.name)
    }
}
