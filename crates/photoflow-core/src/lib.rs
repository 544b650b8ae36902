//! Core of the PhotoFlow media manager: importing media from attached devices (phones and
//! cameras over MTP) into a local cache, and switching between top-level layouts without
//! losing the primary view.
//!
//! # Architecture
//!
//! - `file_system`: `Volume` abstraction over device storage, media classification
//! - `mtp`: well-known device folder catalog and the quick folder scanner
//! - `ingest`: background import worker and the foreground coordinator that owns it
//! - `layout`: view slot and the layout state machine
//! - `config`: import settings loaded from JSON

// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod file_system;
mod ignore_poison;
pub mod ingest;
pub mod layout;
pub mod mtp;

pub use config::{IngestConfig, load_config};
pub use file_system::{DirEntry, InMemoryVolume, LocalVolume, MediaFilter, Volume, VolumeError};
pub use ingest::{
    CoordinatorError, ErrorInfo, ForegroundMarshal, ForegroundQueue, IngestEvent, IngestOutcome, IngestSummary,
    IngestionCoordinator, IngestionJob, JobHandle, JobState, foreground_queue,
};
pub use layout::{
    DisplaySurface, Layout, LayoutError, LayoutSelection, LayoutStateMachine, LayoutTransition, PRIMARY_LAYOUT_ID,
    ViewHandle, ViewId, ViewSlot,
};
pub use mtp::{DiscoveredFolder, PathPattern, PathPatternCatalog, scan_device_folders};

/// Initializes logging. Respects the `RUST_LOG` env var (default: info).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
