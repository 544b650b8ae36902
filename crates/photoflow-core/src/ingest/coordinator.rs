//! Foreground owner of import jobs.
//!
//! One coordinator per device view. It starts at most one job at a time, relays the worker's
//! events to a single listener on the foreground, and keeps the job record up to date. Dropping
//! it cancels the running job and silences everything that job still has in flight.

use log::{debug, error, info, warn};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;

use super::marshal::ForegroundMarshal;
use super::types::{
    CoordinatorError, ErrorInfo, ErrorKind, IngestEvent, IngestOutcome, IngestionJob, JobHandle, JobState,
};
use super::worker::{IngestRequest, run_ingestion};
use crate::config::IngestConfig;
use crate::file_system::{MediaFilter, Volume};
use crate::ignore_poison::IgnorePoison;
use crate::mtp::DiscoveredFolder;

/// Receives every event of the coordinator's jobs, on the foreground.
pub type IngestListener = Box<dyn FnMut(&JobHandle, &IngestEvent) + Send + 'static>;

struct TrackedJob {
    job: IngestionJob,
    cancel: Arc<AtomicBool>,
}

/// State shared between the coordinator and the tasks it posts to the foreground.
struct Shared {
    current: Mutex<Option<TrackedJob>>,
    last_finished: Mutex<Option<IngestionJob>>,
    listener: Mutex<Option<IngestListener>>,
    /// Bumped on every set/clear so a listener that replaced itself isn't put back.
    listener_generation: AtomicU64,
    detached: AtomicBool,
}

/// Starts and tracks imports from one device volume.
pub struct IngestionCoordinator {
    shared: Arc<Shared>,
    volume: Arc<dyn Volume>,
    marshal: Arc<dyn ForegroundMarshal>,
    runtime: Handle,
    media_filter: MediaFilter,
    cache_dir: PathBuf,
    skip_existing: bool,
}

impl IngestionCoordinator {
    pub fn new(
        volume: Arc<dyn Volume>,
        marshal: Arc<dyn ForegroundMarshal>,
        runtime: Handle,
        config: &IngestConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: Mutex::new(None),
                last_finished: Mutex::new(None),
                listener: Mutex::new(None),
                listener_generation: AtomicU64::new(0),
                detached: AtomicBool::new(false),
            }),
            volume,
            marshal,
            runtime,
            media_filter: config.media_filter(),
            cache_dir: config.cache_dir(),
            skip_existing: config.skip_existing,
        }
    }

    /// Starts importing `folder` in the background.
    ///
    /// Fails with `Busy` while another job is pending, running or cancelling. A job counts as
    /// active until its `Finished` event has been delivered on the foreground.
    pub fn start(&self, folder: &DiscoveredFolder) -> Result<JobHandle, CoordinatorError> {
        if self.shared.detached.load(Ordering::Acquire) {
            return Err(CoordinatorError::ShutDown);
        }
        if !self.volume.supports_export() {
            return Err(CoordinatorError::ExportNotSupported {
                volume: self.volume.name().to_string(),
            });
        }

        let mut current = self.shared.current.lock_ignore_poison();
        if let Some(tracked) = current.as_ref()
            && tracked.job.state.is_active()
        {
            debug!("IngestionCoordinator::start: rejecting, job {} still active", tracked.job.id);
            return Err(CoordinatorError::Busy {
                active_job: tracked.job.id,
            });
        }

        let id = JobHandle::new();
        let destination_directory = destination_for(&self.cache_dir, self.volume.name(), &folder.relative_path);
        info!(
            "IngestionCoordinator::start: job={}, folder={}, destination={}",
            id,
            folder.relative_path,
            destination_directory.display()
        );

        let cancel = Arc::new(AtomicBool::new(false));
        *current = Some(TrackedJob {
            job: IngestionJob {
                id,
                source_folder: folder.clone(),
                destination_directory: destination_directory.clone(),
                state: JobState::Pending,
                copied_count: 0,
                total_count: 0,
                last_error: None,
                files: Vec::new(),
            },
            cancel: Arc::clone(&cancel),
        });
        drop(current);

        let request = IngestRequest {
            job: id,
            source_folder: PathBuf::from(&folder.relative_path),
            destination_directory,
            skip_existing: self.skip_existing,
        };
        self.spawn_worker(request, cancel);
        Ok(id)
    }

    fn spawn_worker(&self, request: IngestRequest, cancel: Arc<AtomicBool>) {
        let job = request.job;
        let volume = Arc::clone(&self.volume);
        let media_filter = self.media_filter.clone();
        let worker_marshal = Arc::clone(&self.marshal);
        let worker_shared = Arc::clone(&self.shared);
        let marshal = Arc::clone(&self.marshal);
        let shared = Arc::clone(&self.shared);

        self.runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                run_ingestion(
                    &request,
                    volume.as_ref(),
                    |entry| media_filter.is_media_entry(entry),
                    &cancel,
                    |event| post_event(worker_marshal.as_ref(), &worker_shared, job, event),
                );
            })
            .await;

            // Handle task panic
            if let Err(e) = result {
                error!("IngestionCoordinator: worker for job {} died: {}", job, e);
                let outcome = IngestOutcome::Failed {
                    error: ErrorInfo::new(ErrorKind::TaskFailed, e.to_string()),
                };
                post_event(marshal.as_ref(), &shared, job, IngestEvent::Finished { outcome });
            }
        });
    }

    /// Asks the job to stop after the file it's copying. Already copied files stay.
    ///
    /// Cancelling a job that is already cancelling or has finished does nothing.
    pub fn cancel(&self, job: &JobHandle) -> Result<(), CoordinatorError> {
        if self.shared.detached.load(Ordering::Acquire) {
            return Err(CoordinatorError::ShutDown);
        }
        let mut current = self.shared.current.lock_ignore_poison();
        let Some(tracked) = current.as_mut().filter(|t| t.job.id == *job) else {
            return Err(CoordinatorError::UnknownJob { job: *job });
        };

        match tracked.job.state {
            JobState::Pending | JobState::Running => {
                info!("IngestionCoordinator::cancel: job={}", job);
                tracked.job.state = JobState::Cancelling;
                tracked.cancel.store(true, Ordering::Relaxed);
            }
            state => debug!("IngestionCoordinator::cancel: job {} is {:?}, nothing to do", job, state),
        }
        Ok(())
    }

    /// Sets the listener, replacing any previous one.
    pub fn set_listener<F>(&self, listener: F)
    where
        F: FnMut(&JobHandle, &IngestEvent) + Send + 'static,
    {
        if self.shared.detached.load(Ordering::Acquire) {
            warn!("IngestionCoordinator::set_listener: coordinator is shut down, ignoring");
            return;
        }
        self.shared.listener_generation.fetch_add(1, Ordering::AcqRel);
        *self.shared.listener.lock_ignore_poison() = Some(Box::new(listener));
    }

    pub fn clear_listener(&self) {
        self.shared.listener_generation.fetch_add(1, Ordering::AcqRel);
        self.shared.listener.lock_ignore_poison().take();
    }

    /// Cancels the active job and detaches the listener. Events still in flight are dropped.
    ///
    /// Also runs on drop. Calling it twice is harmless.
    pub fn shutdown(&self) {
        if self.shared.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(tracked) = self.shared.current.lock_ignore_poison().as_ref()
            && tracked.job.state.is_active()
        {
            info!("IngestionCoordinator::shutdown: cancelling job {}", tracked.job.id);
            tracked.cancel.store(true, Ordering::Relaxed);
        }
        self.clear_listener();
    }

    /// Snapshot of a job this coordinator still remembers: the current one or the last finished.
    pub fn job(&self, job: &JobHandle) -> Option<IngestionJob> {
        if let Some(tracked) = self.shared.current.lock_ignore_poison().as_ref()
            && tracked.job.id == *job
        {
            return Some(tracked.job.clone());
        }
        self.shared
            .last_finished
            .lock_ignore_poison()
            .as_ref()
            .filter(|finished| finished.id == *job)
            .cloned()
    }

    /// The job that is pending, running or cancelling, if any.
    pub fn active_job(&self) -> Option<IngestionJob> {
        self.shared
            .current
            .lock_ignore_poison()
            .as_ref()
            .filter(|t| t.job.state.is_active())
            .map(|t| t.job.clone())
    }

    pub fn last_finished(&self) -> Option<IngestionJob> {
        self.shared.last_finished.lock_ignore_poison().clone()
    }
}

impl Drop for IngestionCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Wraps a worker event in a foreground task.
fn post_event(marshal: &dyn ForegroundMarshal, shared: &Arc<Shared>, job: JobHandle, event: IngestEvent) {
    let shared = Arc::clone(shared);
    marshal.post(Box::new(move || shared.deliver(job, event)));
}

impl Shared {
    /// Runs on the foreground: updates the job record, then tells the listener.
    fn deliver(&self, job: JobHandle, event: IngestEvent) {
        if self.detached.load(Ordering::Acquire) {
            debug!("IngestionCoordinator: detached, dropping event for job {}", job);
            return;
        }

        let event = {
            let mut current = self.current.lock_ignore_poison();
            let Some(tracked) = current.as_mut().filter(|t| t.job.id == job) else {
                debug!("IngestionCoordinator: dropping event for stale job {}", job);
                return;
            };
            if tracked.job.state.is_terminal() {
                debug!("IngestionCoordinator: job {} already finished, dropping event", job);
                return;
            }

            let event = apply_event(&mut tracked.job, event);
            if event.is_terminal() {
                *self.last_finished.lock_ignore_poison() = Some(tracked.job.clone());
            } else if tracked.job.state == JobState::Cancelling {
                // The record still counts the in-flight file; the listener only hears the end
                debug!("IngestionCoordinator: job {} is cancelling, holding back {:?}", job, event);
                return;
            }
            event
        };

        self.notify(&job, &event);
    }

    /// Calls the listener without holding any lock, so it may call back into the coordinator.
    fn notify(&self, job: &JobHandle, event: &IngestEvent) {
        let generation = self.listener_generation.load(Ordering::Acquire);
        let Some(mut listener) = self.listener.lock_ignore_poison().take() else {
            return;
        };

        listener(job, event);

        if self.detached.load(Ordering::Acquire) || self.listener_generation.load(Ordering::Acquire) != generation {
            return;
        }
        let mut slot = self.listener.lock_ignore_poison();
        if slot.is_none() {
            *slot = Some(listener);
        }
    }
}

/// Folds `event` into the job record. Returns the event as the listener should see it: a job
/// that was asked to cancel always ends as Cancelled, even if the worker got to the end first.
fn apply_event(job: &mut IngestionJob, event: IngestEvent) -> IngestEvent {
    match event {
        IngestEvent::Started { total_count } => {
            job.total_count = total_count;
            if job.state == JobState::Pending {
                job.state = JobState::Running;
            }
            IngestEvent::Started { total_count }
        }
        IngestEvent::Progress {
            copied_count,
            total_count,
            current_file,
        } => {
            job.copied_count = copied_count;
            IngestEvent::Progress {
                copied_count,
                total_count,
                current_file,
            }
        }
        IngestEvent::Finished { outcome } => {
            let outcome = match (job.state, outcome) {
                (JobState::Cancelling, IngestOutcome::Succeeded { files, .. }) => {
                    job.files = files;
                    IngestOutcome::Cancelled {
                        copied: job.files.len(),
                    }
                }
                (JobState::Cancelling, IngestOutcome::Failed { .. }) => IngestOutcome::Cancelled { copied: 0 },
                (_, outcome) => outcome,
            };

            match &outcome {
                IngestOutcome::Succeeded { files, skipped } => {
                    job.state = JobState::Succeeded;
                    job.files = files.clone();
                    if !skipped.is_empty() {
                        job.last_error = Some(ErrorInfo::from_skipped(skipped.clone(), false));
                    }
                }
                IngestOutcome::Failed { error } => {
                    job.state = JobState::Failed;
                    job.last_error = Some(error.clone());
                }
                IngestOutcome::Cancelled { .. } => job.state = JobState::Cancelled,
            }
            info!("IngestionCoordinator: job {} finished as {:?}", job.id, job.state);
            IngestEvent::Finished { outcome }
        }
    }
}

/// `<cache>/<device name>/<folder path>`, using only plain path segments so a hostile device
/// name or folder path can't escape the cache folder.
fn destination_for(cache_dir: &Path, volume_name: &str, relative_path: &str) -> PathBuf {
    let device: String = volume_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let device = device.trim().trim_start_matches('.');
    let mut destination = cache_dir.join(if device.is_empty() { "device" } else { device });
    for component in Path::new(relative_path).components() {
        if let Component::Normal(segment) = component {
            destination.push(segment);
        }
    }
    destination
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SkippedFile;

    fn job() -> IngestionJob {
        IngestionJob {
            id: JobHandle::new(),
            source_folder: DiscoveredFolder {
                relative_path: "DCIM/Camera".to_string(),
                display_name: "Camera".to_string(),
                media_count: 3,
            },
            destination_directory: PathBuf::from("/cache/Pixel/DCIM/Camera"),
            state: JobState::Running,
            copied_count: 0,
            total_count: 3,
            last_error: None,
            files: Vec::new(),
        }
    }

    #[test]
    fn test_destination_stays_inside_cache() {
        let cache = Path::new("/cache");
        assert_eq!(
            destination_for(cache, "Pixel 8", "DCIM/Camera"),
            PathBuf::from("/cache/Pixel 8/DCIM/Camera")
        );
        assert_eq!(
            destination_for(cache, "../evil/name", "/../DCIM/./Camera/"),
            PathBuf::from("/cache/_evil_name/DCIM/Camera")
        );
        assert_eq!(destination_for(cache, "  ", ""), PathBuf::from("/cache/device"));
    }

    #[test]
    fn test_succeeded_with_skips_sets_last_error() {
        let mut job = job();
        let event = apply_event(
            &mut job,
            IngestEvent::Finished {
                outcome: IngestOutcome::Succeeded {
                    files: vec![PathBuf::from("/cache/a.jpg")],
                    skipped: vec![SkippedFile {
                        name: "b.jpg".to_string(),
                        reason: "gone".to_string(),
                    }],
                },
            },
        );
        assert!(event.is_terminal());
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.files.len(), 1);
        let error = job.last_error.unwrap();
        assert_eq!(error.kind, ErrorKind::SomeFilesSkipped);
        assert!(error.message.contains("b.jpg"));
    }

    #[test]
    fn test_cancelling_job_always_ends_cancelled() {
        let mut job = job();
        job.state = JobState::Cancelling;
        let event = apply_event(
            &mut job,
            IngestEvent::Finished {
                outcome: IngestOutcome::Succeeded {
                    files: vec![PathBuf::from("/cache/a.jpg"), PathBuf::from("/cache/b.jpg")],
                    skipped: Vec::new(),
                },
            },
        );
        assert_eq!(
            event,
            IngestEvent::Finished {
                outcome: IngestOutcome::Cancelled { copied: 2 }
            }
        );
        assert_eq!(job.state, JobState::Cancelled);
    }

    #[test]
    fn test_started_moves_pending_to_running_but_not_cancelling() {
        let mut pending = job();
        pending.state = JobState::Pending;
        apply_event(&mut pending, IngestEvent::Started { total_count: 7 });
        assert_eq!(pending.state, JobState::Running);
        assert_eq!(pending.total_count, 7);

        let mut cancelling = job();
        cancelling.state = JobState::Cancelling;
        apply_event(&mut cancelling, IngestEvent::Started { total_count: 7 });
        assert_eq!(cancelling.state, JobState::Cancelling);
    }

    #[tokio::test]
    async fn test_events_for_other_jobs_are_dropped() {
        let volume = crate::file_system::InMemoryVolume::new("Pixel 8");
        volume.add_file("DCIM/Camera/IMG_1.jpg", b"1");
        let cache = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            cache_dir: Some(cache.path().to_path_buf()),
            ..IngestConfig::default()
        };
        let (marshal, mut queue) = crate::ingest::foreground_queue();
        let marshal: Arc<dyn ForegroundMarshal> = Arc::new(marshal);
        let coordinator = IngestionCoordinator::new(Arc::new(volume), Arc::clone(&marshal), Handle::current(), &config);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        coordinator.set_listener(move |job, _| sink.lock().unwrap().push(*job));

        let stale = JobHandle::new();
        post_event(marshal.as_ref(), &coordinator.shared, stale, IngestEvent::Started { total_count: 9 });
        assert_eq!(queue.run_pending(), 1);
        assert!(seen.lock().unwrap().is_empty());

        let current = coordinator.start(&job().source_folder).unwrap();
        post_event(
            marshal.as_ref(),
            &coordinator.shared,
            stale,
            IngestEvent::Finished {
                outcome: IngestOutcome::Cancelled { copied: 0 },
            },
        );
        while coordinator.active_job().is_some() {
            assert!(
                tokio::time::timeout(std::time::Duration::from_secs(5), queue.run_next())
                    .await
                    .unwrap()
            );
        }

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|job| *job == current));
        assert_eq!(coordinator.job(&current).unwrap().state, JobState::Succeeded);
    }
}
