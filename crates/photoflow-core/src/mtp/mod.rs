//! MTP (Media Transfer Protocol) device folder discovery.
//!
//! Phones and cameras keep photos in a handful of conventional places (DCIM/Camera,
//! Pictures/Screenshots, messenger media folders). Rather than walking the whole device, which
//! takes minutes over MTP, we probe those places directly.
//!
//! # Architecture
//!
//! - `types`: folder and pattern types shared with the UI
//! - `catalog`: the known relative paths and their labels
//! - `scanner`: the quick, bounded probe of a device volume

mod catalog;
mod scanner;
pub mod types;

pub use catalog::{CatalogError, PathPatternCatalog};
pub use scanner::{DEFAULT_PROBE_LIMIT, scan_device_folders};
pub use types::{DiscoveredFolder, PathPattern};
