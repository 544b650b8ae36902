//! Storage access for media import: the `Volume` abstraction and media classification.

mod media;
pub mod volume;

pub use media::MediaFilter;
pub use volume::{DirEntry, InMemoryVolume, LocalVolume, Volume, VolumeError};
