//! In-memory volume for tests.
//!
//! Models a device tree with injectable failures (unlistable folders, files that refuse to
//! copy) and counts device round-trips so callers can assert on probe cost.

use super::{DirEntry, Volume, VolumeError, sort_entries, write_then_rename};
use crate::ignore_poison::IgnorePoison;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

enum Node {
    Directory,
    File(Vec<u8>),
}

#[derive(Default)]
struct Faults {
    unlistable: HashSet<PathBuf>,
    uncopyable: HashSet<PathBuf>,
}

/// A volume that keeps its whole tree in memory.
pub struct InMemoryVolume {
    name: String,
    root: PathBuf,
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    faults: Mutex<Faults>,
    round_trips: AtomicUsize,
}

/// Strips root, "." and ".." noise so "/DCIM/./Camera" and "DCIM/Camera" are the same key.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

impl InMemoryVolume {
    /// Creates an empty volume (just the root directory).
    pub fn new(name: impl Into<String>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::new(), Node::Directory);
        Self {
            name: name.into(),
            root: PathBuf::from("/"),
            nodes: Mutex::new(nodes),
            faults: Mutex::new(Faults::default()),
            round_trips: AtomicUsize::new(0),
        }
    }

    /// Adds a directory and all its missing parents.
    pub fn add_directory(&self, path: impl AsRef<Path>) -> &Self {
        let path = normalize(path.as_ref());
        let mut nodes = self.nodes.lock_ignore_poison();
        for ancestor in path.ancestors() {
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Directory);
        }
        self
    }

    /// Adds a file with the given content, creating missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: &[u8]) -> &Self {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_directory(parent);
        }
        self.nodes
            .lock_ignore_poison()
            .insert(path, Node::File(content.to_vec()));
        self
    }

    /// Makes listing this directory fail, as if the device stopped answering.
    pub fn fail_listing(&self, path: impl AsRef<Path>) -> &Self {
        self.faults
            .lock_ignore_poison()
            .unlistable
            .insert(normalize(path.as_ref()));
        self
    }

    /// Makes copying this file fail.
    pub fn fail_copy(&self, path: impl AsRef<Path>) -> &Self {
        self.faults
            .lock_ignore_poison()
            .uncopyable
            .insert(normalize(path.as_ref()));
        self
    }

    /// Number of device calls (`exists`, `list_entries`, `copy_file`) made so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::Relaxed)
    }

    fn count_round_trip(&self) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
    }
}

impl Volume for InMemoryVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        self.count_round_trip();
        self.nodes.lock_ignore_poison().contains_key(&normalize(path))
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, VolumeError> {
        self.count_round_trip();
        let dir = normalize(path);
        if self.faults.lock_ignore_poison().unlistable.contains(&dir) {
            return Err(VolumeError::Disconnected {
                message: format!("listing {} timed out", dir.display()),
            });
        }

        let nodes = self.nodes.lock_ignore_poison();
        match nodes.get(&dir) {
            Some(Node::Directory) => {}
            Some(Node::File(_)) => {
                return Err(VolumeError::IoError {
                    message: format!("Not a directory: {}", dir.display()),
                });
            }
            None => {
                return Err(VolumeError::NotFound {
                    path: dir.display().to_string(),
                });
            }
        }

        let mut entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(key, _)| !key.as_os_str().is_empty() && key.parent() == Some(dir.as_path()))
            .filter_map(|(key, node)| {
                let name = key.file_name()?.to_string_lossy().into_owned();
                Some(match node {
                    Node::Directory => DirEntry::directory(name),
                    Node::File(content) => DirEntry::file(name, content.len() as u64),
                })
            })
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn supports_export(&self) -> bool {
        true
    }

    fn copy_file(&self, path: &Path, destination_dir: &Path) -> Result<PathBuf, VolumeError> {
        self.count_round_trip();
        let key = normalize(path);
        if self.faults.lock_ignore_poison().uncopyable.contains(&key) {
            return Err(VolumeError::IoError {
                message: format!("transfer of {} aborted by device", key.display()),
            });
        }

        let content = match self.nodes.lock_ignore_poison().get(&key) {
            Some(Node::File(content)) => content.clone(),
            _ => {
                return Err(VolumeError::NotFound {
                    path: key.display().to_string(),
                });
            }
        };
        let name = key
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        write_then_rename(destination_dir, &name, |temp| fs::write(temp, &content))
    }
}
