//! The import loop that runs on a background thread.
//!
//! Copy flow:
//! 1. Create the destination folder
//! 2. List the device folder once; the media files in it are the job (`Started`)
//! 3. Copy them one at a time, in listing order (`Progress` after each attempt)
//! 4. Finish with exactly one `Finished` event
//!
//! A file that fails to copy is skipped. The job only fails if nothing at all was copied.
//! Cancellation is checked between files, never in the middle of one.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::{ErrorInfo, ErrorKind, IngestEvent, IngestOutcome, JobHandle, SkippedFile};
use crate::file_system::{DirEntry, Volume};

/// What a worker needs to know about its job.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub job: JobHandle,
    /// Folder on the device, relative to the volume root.
    pub source_folder: PathBuf,
    /// Local folder the files are copied into.
    pub destination_directory: PathBuf,
    /// Reuse a file already in the destination if its size matches, instead of copying again.
    pub skip_existing: bool,
}

/// Runs one import to completion, reporting through `emit`.
///
/// Emits `Started`, then one `Progress` per attempted file, then exactly one `Finished`
/// (unless setup fails, in which case `Finished` comes alone). Never touches source files.
pub fn run_ingestion<F, E>(request: &IngestRequest, volume: &dyn Volume, is_media: F, cancel: &AtomicBool, mut emit: E)
where
    F: Fn(&DirEntry) -> bool,
    E: FnMut(IngestEvent),
{
    let outcome = copy_folder(request, volume, is_media, cancel, &mut emit);
    match &outcome {
        IngestOutcome::Succeeded { files, skipped } => info!(
            "run_ingestion: job {} succeeded, {} copied, {} skipped",
            request.job,
            files.len(),
            skipped.len()
        ),
        IngestOutcome::Failed { error } => warn!("run_ingestion: job {} failed: {}", request.job, error.message),
        IngestOutcome::Cancelled { copied } => {
            info!("run_ingestion: job {} cancelled after {} files", request.job, copied)
        }
    }
    emit(IngestEvent::Finished { outcome });
}

fn copy_folder<F, E>(
    request: &IngestRequest,
    volume: &dyn Volume,
    is_media: F,
    cancel: &AtomicBool,
    emit: &mut E,
) -> IngestOutcome
where
    F: Fn(&DirEntry) -> bool,
    E: FnMut(IngestEvent),
{
    if let Err(e) = fs::create_dir_all(&request.destination_directory) {
        return IngestOutcome::Failed {
            error: ErrorInfo::new(
                ErrorKind::DestinationUnavailable,
                format!("{}: {}", request.destination_directory.display(), e),
            ),
        };
    }

    if cancel.load(Ordering::Relaxed) {
        return IngestOutcome::Cancelled { copied: 0 };
    }

    let sources: Vec<DirEntry> = match volume.list_entries(&request.source_folder) {
        Ok(entries) => entries.into_iter().filter(|entry| is_media(entry)).collect(),
        Err(e) => {
            return IngestOutcome::Failed {
                error: ErrorInfo::new(
                    ErrorKind::EnumerationFailed,
                    format!("{}: {}", request.source_folder.display(), e),
                ),
            };
        }
    };
    let total_count = sources.len();
    debug!(
        "run_ingestion: job {} found {} media files in {}",
        request.job,
        total_count,
        request.source_folder.display()
    );
    emit(IngestEvent::Started { total_count });

    if total_count == 0 {
        return IngestOutcome::Failed {
            error: ErrorInfo::new(
                ErrorKind::NoMediaFiles,
                format!("{} has no media files", request.source_folder.display()),
            ),
        };
    }

    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for (index, entry) in sources.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return IngestOutcome::Cancelled { copied: files.len() };
        }

        match copy_one(request, volume, entry) {
            Ok(path) => files.push(path),
            Err(reason) => {
                warn!("run_ingestion: job {} skipping {}: {}", request.job, entry.name, reason);
                skipped.push(SkippedFile {
                    name: entry.name.clone(),
                    reason,
                });
            }
        }

        emit(IngestEvent::Progress {
            copied_count: index + 1,
            total_count,
            current_file: entry.name.clone(),
        });
    }

    // A cancel that came in during the last copy still wins
    if cancel.load(Ordering::Relaxed) {
        return IngestOutcome::Cancelled { copied: files.len() };
    }

    if files.is_empty() {
        IngestOutcome::Failed {
            error: ErrorInfo::from_skipped(skipped, true),
        }
    } else {
        IngestOutcome::Succeeded { files, skipped }
    }
}

fn copy_one(request: &IngestRequest, volume: &dyn Volume, entry: &DirEntry) -> Result<PathBuf, String> {
    if request.skip_existing
        && let Some(existing) = already_imported(&request.destination_directory, entry)
    {
        debug!("run_ingestion: {} already imported, reusing", entry.name);
        return Ok(existing);
    }

    let source = request.source_folder.join(&entry.name);
    volume
        .copy_file(&source, &request.destination_directory)
        .map_err(|e| e.to_string())
}

/// Returns the existing local copy if it has the same size as the device file.
fn already_imported(destination_directory: &Path, entry: &DirEntry) -> Option<PathBuf> {
    let expected = entry.size?;
    let local = destination_directory.join(&entry.name);
    let metadata = fs::metadata(&local).ok()?;
    (metadata.is_file() && metadata.len() == expected).then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system::{InMemoryVolume, MediaFilter};
    use crate::ingest::types::ErrorKind;

    fn is_media(entry: &DirEntry) -> bool {
        MediaFilter::new().is_media_entry(entry)
    }

    fn camera_with(count: usize) -> InMemoryVolume {
        let volume = InMemoryVolume::new("Pixel 8");
        for i in 1..=count {
            volume.add_file(format!("DCIM/Camera/IMG_{}.jpg", i), format!("photo {}", i).as_bytes());
        }
        volume
    }

    fn request(dest: &Path) -> IngestRequest {
        IngestRequest {
            job: JobHandle::new(),
            source_folder: PathBuf::from("DCIM/Camera"),
            destination_directory: dest.join("Camera"),
            skip_existing: true,
        }
    }

    fn run(request: &IngestRequest, volume: &InMemoryVolume, cancel: &AtomicBool) -> Vec<IngestEvent> {
        let mut events = Vec::new();
        run_ingestion(request, volume, is_media, cancel, |event| events.push(event));
        events
    }

    fn local_file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn test_copies_every_file_in_order() {
        let volume = camera_with(3);
        let dest = tempfile::tempdir().unwrap();
        let request = request(dest.path());

        let events = run(&request, &volume, &AtomicBool::new(false));

        assert_eq!(events[0], IngestEvent::Started { total_count: 3 });
        let progress: Vec<(usize, String)> = events
            .iter()
            .filter_map(|e| match e {
                IngestEvent::Progress {
                    copied_count,
                    current_file,
                    ..
                } => Some((*copied_count, current_file.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            progress,
            vec![
                (1, "IMG_1.jpg".to_string()),
                (2, "IMG_2.jpg".to_string()),
                (3, "IMG_3.jpg".to_string()),
            ]
        );
        match events.last().unwrap() {
            IngestEvent::Finished {
                outcome: IngestOutcome::Succeeded { files, skipped },
            } => {
                assert_eq!(files.len(), 3);
                assert!(skipped.is_empty());
            }
            other => panic!("unexpected final event: {:?}", other),
        }
        assert_eq!(fs::read(request.destination_directory.join("IMG_2.jpg")).unwrap(), b"photo 2");
        // Source untouched
        assert!(volume.exists(Path::new("DCIM/Camera/IMG_2.jpg")));
    }

    #[test]
    fn test_partial_failure_still_succeeds() {
        let volume = camera_with(10);
        volume.fail_copy("DCIM/Camera/IMG_3.jpg").fail_copy("DCIM/Camera/IMG_7.jpg");
        let dest = tempfile::tempdir().unwrap();
        let request = request(dest.path());

        let events = run(&request, &volume, &AtomicBool::new(false));

        let last_progress = events
            .iter()
            .rev()
            .find_map(|e| match e {
                IngestEvent::Progress { copied_count, .. } => Some(*copied_count),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_progress, 10);
        match events.last().unwrap() {
            IngestEvent::Finished {
                outcome: IngestOutcome::Succeeded { files, skipped },
            } => {
                assert_eq!(files.len(), 8);
                let names: Vec<&str> = skipped.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["IMG_3.jpg", "IMG_7.jpg"]);
            }
            other => panic!("unexpected final event: {:?}", other),
        }
        assert_eq!(local_file_count(&request.destination_directory), 8);
    }

    #[test]
    fn test_all_copies_failing_is_failure() {
        let volume = camera_with(2);
        volume.fail_copy("DCIM/Camera/IMG_1.jpg").fail_copy("DCIM/Camera/IMG_2.jpg");
        let dest = tempfile::tempdir().unwrap();

        let events = run(&request(dest.path()), &volume, &AtomicBool::new(false));

        match events.last().unwrap() {
            IngestEvent::Finished {
                outcome: IngestOutcome::Failed { error },
            } => {
                assert_eq!(error.kind, ErrorKind::AllCopiesFailed);
                assert_eq!(error.skipped.len(), 2);
            }
            other => panic!("unexpected final event: {:?}", other),
        }
    }

    #[test]
    fn test_cancel_after_four_files() {
        let volume = camera_with(10);
        let dest = tempfile::tempdir().unwrap();
        let request = request(dest.path());
        let cancel = AtomicBool::new(false);

        let mut events = Vec::new();
        run_ingestion(&request, &volume, is_media, &cancel, |event| {
            if let IngestEvent::Progress { copied_count: 4, .. } = event {
                cancel.store(true, Ordering::Relaxed);
            }
            events.push(event);
        });

        assert_eq!(
            events.last(),
            Some(&IngestEvent::Finished {
                outcome: IngestOutcome::Cancelled { copied: 4 }
            })
        );
        let progress_count = events
            .iter()
            .filter(|e| matches!(e, IngestEvent::Progress { .. }))
            .count();
        assert_eq!(progress_count, 4);
        assert_eq!(local_file_count(&request.destination_directory), 4);
    }

    #[test]
    fn test_cancel_before_start_copies_nothing() {
        let volume = camera_with(3);
        let dest = tempfile::tempdir().unwrap();
        let request = request(dest.path());

        let events = run(&request, &volume, &AtomicBool::new(true));

        assert_eq!(
            events,
            vec![IngestEvent::Finished {
                outcome: IngestOutcome::Cancelled { copied: 0 }
            }]
        );
        assert_eq!(local_file_count(&request.destination_directory), 0);
    }

    #[test]
    fn test_enumeration_failure_is_failure() {
        let volume = camera_with(3);
        volume.fail_listing("DCIM/Camera");
        let dest = tempfile::tempdir().unwrap();

        let events = run(&request(dest.path()), &volume, &AtomicBool::new(false));

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            IngestEvent::Finished {
                outcome: IngestOutcome::Failed { error }
            } if error.kind == ErrorKind::EnumerationFailed
        ));
    }

    #[test]
    fn test_folder_without_media_fails() {
        let volume = InMemoryVolume::new("Pixel 8");
        volume.add_file("DCIM/Camera/notes.txt", b"hi");
        let dest = tempfile::tempdir().unwrap();

        let events = run(&request(dest.path()), &volume, &AtomicBool::new(false));

        assert_eq!(events[0], IngestEvent::Started { total_count: 0 });
        assert!(matches!(
            &events[1],
            IngestEvent::Finished {
                outcome: IngestOutcome::Failed { error }
            } if error.kind == ErrorKind::NoMediaFiles
        ));
    }

    #[test]
    fn test_existing_copy_with_same_size_is_reused() {
        let volume = camera_with(2);
        let dest = tempfile::tempdir().unwrap();
        let request = request(dest.path());
        fs::create_dir_all(&request.destination_directory).unwrap();
        fs::write(request.destination_directory.join("IMG_1.jpg"), b"photo 1").unwrap();

        run(&request, &volume, &AtomicBool::new(false));

        // Only IMG_2 needed a device transfer: one listing plus one copy
        assert_eq!(volume.round_trips(), 2);
    }

    #[test]
    fn test_unwritable_destination_fails() {
        let volume = camera_with(1);
        let dest = tempfile::tempdir().unwrap();
        let blocker = dest.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let request = IngestRequest {
            destination_directory: blocker.join("Camera"),
            ..request(dest.path())
        };

        let events = run(&request, &volume, &AtomicBool::new(false));

        assert!(matches!(
            &events[0],
            IngestEvent::Finished {
                outcome: IngestOutcome::Failed { error }
            } if error.kind == ErrorKind::DestinationUnavailable
        ));
    }
}
