//! Quick scan of a device for known media folders.
//!
//! Runs inline on the foreground when the user opens a device, so it must stay fast: at most
//! two device round-trips per catalog pattern, no recursion. Anything that goes wrong for one
//! pattern just drops that pattern from the result.

use super::catalog::PathPatternCatalog;
use super::types::DiscoveredFolder;
use crate::file_system::{DirEntry, Volume};
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// How many media files to count per folder before settling for "at least this many".
pub const DEFAULT_PROBE_LIMIT: usize = 50;

/// Finds the catalog folders that exist on `volume` and contain at least one media file.
///
/// The result keeps catalog order. Counts are lower bounds capped at `probe_limit` (a limit of
/// 0 is treated as 1), and counting stops at the limit. Never fails: an unreachable device
/// yields an empty list.
pub fn scan_device_folders<F>(
    volume: &dyn Volume,
    catalog: &PathPatternCatalog,
    is_media: F,
    probe_limit: usize,
) -> Vec<DiscoveredFolder>
where
    F: Fn(&DirEntry) -> bool,
{
    let probe_limit = probe_limit.max(1);
    let start = Instant::now();
    let mut folders = Vec::new();

    for pattern in catalog.patterns() {
        let path = Path::new(&pattern.relative_path);
        if !volume.exists(path) {
            continue;
        }

        let media_count = match volume.count_media(path, &is_media, probe_limit) {
            Ok(count) => count,
            Err(e) => {
                debug!(
                    "scan_device_folders: treating {} as absent on {}: {}",
                    pattern.relative_path,
                    volume.name(),
                    e
                );
                continue;
            }
        };
        if media_count == 0 {
            continue;
        }

        folders.push(DiscoveredFolder {
            relative_path: pattern.relative_path.clone(),
            display_name: catalog.display_name_for(&pattern.relative_path),
            media_count,
        });
    }

    info!(
        "scan_device_folders: {} found {} of {} folders in {:?}",
        volume.name(),
        folders.len(),
        catalog.patterns().len(),
        start.elapsed()
    );
    folders
}
