//! Importing media from a device folder into the local cache.
//!
//! The work happens on a blocking background task (`worker`). Everything the worker reports is
//! marshalled to the foreground (`marshal`), where the `coordinator` updates the job record and
//! calls the listener. The UI only ever talks to the coordinator.

mod coordinator;
mod marshal;
mod types;
mod worker;


pub use coordinator::{IngestListener, IngestionCoordinator};
pub use marshal::{ForegroundMarshal, ForegroundQueue, ForegroundTask, QueueMarshal, foreground_queue};
pub use types::{
    CoordinatorError, ErrorInfo, ErrorKind, IngestEvent, IngestOutcome, IngestSummary, IngestionJob, JobHandle,
    JobState, SkippedFile,
};
pub use worker::{IngestRequest, run_ingestion};
