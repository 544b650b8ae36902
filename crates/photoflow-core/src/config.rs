//! Import settings.
//!
//! Read from a JSON file written by the settings UI. Every field is optional in the file, so a
//! partial or older file still loads.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::file_system::MediaFilter;
use crate::mtp::{DEFAULT_PROBE_LIMIT, PathPattern, PathPatternCatalog};

/// Settings for device scanning and importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    /// Stop counting media files in a folder after this many
    pub probe_limit: usize,
    /// Where imported files go. `None` means the platform cache folder.
    pub cache_dir: Option<PathBuf>,
    /// Extensions (without dot) to treat as media on top of the built-in ones
    pub extra_media_extensions: Vec<String>,
    /// Device folders to look for after the built-in ones
    pub extra_patterns: Vec<PathPattern>,
    /// Reuse already imported files of the same size instead of copying them again
    pub skip_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            probe_limit: DEFAULT_PROBE_LIMIT,
            cache_dir: None,
            extra_media_extensions: Vec::new(),
            extra_patterns: Vec::new(),
            skip_existing: true,
        }
    }
}

impl IngestConfig {
    /// The folder imports are copied under, like `~/.cache/photoflow/device-imports`.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("photoflow")
            .join("device-imports")
    }

    pub fn media_filter(&self) -> MediaFilter {
        MediaFilter::new().with_extra_extensions(&self.extra_media_extensions)
    }

    /// The built-in catalog followed by `extra_patterns`. A configured path that repeats one
    /// already in the catalog is dropped.
    pub fn catalog(&self) -> PathPatternCatalog {
        let builtin = PathPatternCatalog::builtin();
        let mut extra: Vec<PathPattern> = Vec::new();
        for pattern in &self.extra_patterns {
            let mut candidate = extra.clone();
            candidate.push(pattern.clone());
            match builtin.extended(&candidate) {
                Ok(_) => extra = candidate,
                Err(e) => warn!("IngestConfig::catalog: ignoring pattern: {}", e),
            }
        }
        builtin.extended(&extra).unwrap_or_else(|_| builtin.clone())
    }
}

/// Loads settings from `path`.
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> IngestConfig {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("load_config: using defaults, couldn't read {}: {}", path.display(), e);
            return IngestConfig::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            warn!("load_config: using defaults, {} is malformed: {}", path.display(), e);
            IngestConfig::default()
        }
    }
}
