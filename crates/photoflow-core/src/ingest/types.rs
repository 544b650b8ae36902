//! Type definitions for device imports.
//!
//! Contains the job record, events, outcomes and error types.

use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::mtp::DiscoveredFolder;

// ============================================================================
// Job identity and state
// ============================================================================

/// Opaque handle to one import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobHandle(Uuid);

impl JobHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a job: Pending → Running → Succeeded | Failed | Cancelled.
/// Cancelling sits between Running and Cancelled, only after an explicit cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Cancelling,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    /// Pending, Running or Cancelling.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running | Self::Cancelling)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

/// Snapshot of an import job. The coordinator owns the live record; callers get copies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJob {
    pub id: JobHandle,
    pub source_folder: DiscoveredFolder,
    pub destination_directory: PathBuf,
    pub state: JobState,
    /// Files attempted so far, whether or not they copied.
    pub copied_count: usize,
    /// Fixed once the folder has been enumerated (0 before that).
    pub total_count: usize,
    pub last_error: Option<ErrorInfo>,
    /// Local paths of the imported files, set when the job succeeds.
    pub files: Vec<PathBuf>,
}

impl IngestionJob {
    /// What to tell the user about a successful import. `None` unless the job succeeded.
    pub fn summary(&self) -> Option<IngestSummary> {
        (self.state == JobState::Succeeded).then(|| IngestSummary {
            imported: self.files.len(),
            skipped: self.last_error.as_ref().map(|e| e.skipped.len()).unwrap_or(0),
            destination_directory: self.destination_directory.clone(),
        })
    }
}

/// Result summary shown after a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub imported: usize,
    pub skipped: usize,
    pub destination_directory: PathBuf,
}

impl IngestSummary {
    pub fn user_message(&self) -> String {
        let imported = format!("Imported {} {}.", self.imported, plural_files(self.imported));
        match self.skipped {
            0 => imported,
            skipped => format!(
                "{} {} could not be copied and {} skipped.",
                imported,
                count_files(skipped),
                if skipped == 1 { "was" } else { "were" }
            ),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Event delivered to the foreground listener for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestEvent {
    /// The folder was enumerated; `total_count` won't change anymore.
    Started { total_count: usize },
    /// One more file was attempted.
    Progress {
        copied_count: usize,
        total_count: usize,
        /// Filename only, not full path
        current_file: String,
    },
    /// Always the last event of a job, delivered exactly once.
    Finished { outcome: IngestOutcome },
}

impl IngestEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// At least one file copied. `skipped` lists the files that didn't.
    Succeeded { files: Vec<PathBuf>, skipped: Vec<SkippedFile> },
    /// Nothing was copied.
    Failed { error: ErrorInfo },
    /// Stopped on request. Files copied before that stay in place.
    Cancelled { copied: usize },
}

/// A file that failed to copy and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Category of an import problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The local cache folder couldn't be created
    DestinationUnavailable,
    /// The device folder couldn't be listed
    EnumerationFailed,
    /// The device folder has no media files (anymore)
    NoMediaFiles,
    /// Every file failed to copy
    AllCopiesFailed,
    /// Some files failed to copy, the rest made it
    SomeFilesSkipped,
    /// The background task died
    TaskFailed,
}

/// Describes why a job failed, or which files a successful job had to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub skipped: Vec<SkippedFile>,
}

/// How many skipped files `ErrorInfo` names before summarizing the rest. The full list stays in
/// `skipped`.
const MAX_NAMED_SKIPS: usize = 10;

impl ErrorInfo {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            skipped: Vec::new(),
        }
    }

    /// Summarizes per-file failures. `all_failed` picks between a failed job and a partial one.
    pub(crate) fn from_skipped(skipped: Vec<SkippedFile>, all_failed: bool) -> Self {
        let names: Vec<&str> = skipped
            .iter()
            .take(MAX_NAMED_SKIPS)
            .map(|s| s.name.as_str())
            .collect();
        let mut message = format!("{} could not be copied: {}", count_files(skipped.len()), names.join(", "));
        if skipped.len() > MAX_NAMED_SKIPS {
            message.push_str(&format!(", and {} more", skipped.len() - MAX_NAMED_SKIPS));
        }
        Self {
            kind: if all_failed {
                ErrorKind::AllCopiesFailed
            } else {
                ErrorKind::SomeFilesSkipped
            },
            message,
            skipped,
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::DestinationUnavailable => {
                format!("Couldn't prepare the import folder on this computer: {}", self.message)
            }
            ErrorKind::EnumerationFailed => format!(
                "Couldn't read the folder from the device. It may have been disconnected or locked. ({})",
                self.message
            ),
            ErrorKind::NoMediaFiles => "There are no photos or videos in this folder anymore.".to_string(),
            ErrorKind::AllCopiesFailed => format!(
                "None of the {} could be copied. Check that the device is unlocked and still connected.",
                count_files(self.skipped.len())
            ),
            ErrorKind::SomeFilesSkipped => format!("{} skipped.", count_files(self.skipped.len())),
            ErrorKind::TaskFailed => format!("The import stopped unexpectedly: {}", self.message),
        }
    }
}

/// Errors returned synchronously by the coordinator. These are caller mistakes, not device
/// trouble, so they're never worth retrying as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorError {
    /// Another job is still pending, running or cancelling
    Busy { active_job: JobHandle },
    /// The handle doesn't belong to this coordinator's current job
    UnknownJob { job: JobHandle },
    /// The device volume can't copy files out
    ExportNotSupported { volume: String },
    /// The coordinator was torn down
    ShutDown,
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy { active_job } => write!(f, "An import is already in progress: {}", active_job),
            Self::UnknownJob { job } => write!(f, "Unknown import job: {}", job),
            Self::ExportNotSupported { volume } => write!(f, "Volume '{}' does not support export", volume),
            Self::ShutDown => write!(f, "Import coordinator was shut down"),
        }
    }
}

impl std::error::Error for CoordinatorError {}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn count_files(count: usize) -> String {
    format!("{} {}", count, plural_files(count))
}
