//! Tests for InMemoryVolume.

use super::{DirEntry, InMemoryVolume, Volume, VolumeError};
use std::path::Path;

fn phone() -> InMemoryVolume {
    let volume = InMemoryVolume::new("Pixel 8");
    volume
        .add_file("DCIM/Camera/IMG_10.jpg", b"ten")
        .add_file("DCIM/Camera/IMG_2.jpg", b"two")
        .add_directory("DCIM/Camera/.thumbnails")
        .add_directory("Download");
    volume
}

#[test]
fn test_list_entries_directories_first_then_natural_order() {
    let volume = phone();
    let entries = volume.list_entries(Path::new("DCIM/Camera")).unwrap();
    assert_eq!(
        entries,
        vec![
            DirEntry::directory(".thumbnails"),
            DirEntry::file("IMG_2.jpg", 3),
            DirEntry::file("IMG_10.jpg", 3),
        ]
    );
}

#[test]
fn test_list_entries_only_direct_children() {
    let volume = phone();
    let names: Vec<String> = volume
        .list_entries(Path::new(""))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["DCIM", "Download"]);
}

#[test]
fn test_paths_are_normalized() {
    let volume = phone();
    assert!(volume.exists(Path::new("/DCIM/./Camera")));
    assert!(volume.exists(Path::new("DCIM/Camera/IMG_2.jpg")));
    assert!(!volume.exists(Path::new("Pictures")));
}

#[test]
fn test_list_missing_directory_is_not_found() {
    let volume = phone();
    let err = volume.list_entries(Path::new("Pictures/Screenshots")).unwrap_err();
    assert!(matches!(err, VolumeError::NotFound { .. }));
}

#[test]
fn test_fail_listing_injects_error() {
    let volume = phone();
    volume.fail_listing("DCIM/Camera");
    let err = volume.list_entries(Path::new("DCIM/Camera")).unwrap_err();
    assert!(matches!(err, VolumeError::Disconnected { .. }));
}

#[test]
fn test_copy_file_writes_content() {
    let volume = phone();
    let dest = tempfile::tempdir().expect("temp dir");

    let copied = volume
        .copy_file(Path::new("DCIM/Camera/IMG_2.jpg"), dest.path())
        .unwrap();

    assert_eq!(copied, dest.path().join("IMG_2.jpg"));
    assert_eq!(std::fs::read(&copied).unwrap(), b"two");
    // No leftover temp file
    assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 1);
}

#[test]
fn test_fail_copy_leaves_nothing_behind() {
    let volume = phone();
    volume.fail_copy("DCIM/Camera/IMG_2.jpg");
    let dest = tempfile::tempdir().expect("temp dir");

    let result = volume.copy_file(Path::new("DCIM/Camera/IMG_2.jpg"), dest.path());

    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn test_round_trips_are_counted() {
    let volume = phone();
    assert_eq!(volume.round_trips(), 0);
    volume.exists(Path::new("DCIM"));
    let _ = volume.list_entries(Path::new("DCIM"));
    assert_eq!(volume.round_trips(), 2);
}

#[test]
fn test_count_media_is_one_round_trip_and_capped() {
    let volume = phone();
    let is_file = |entry: &DirEntry| !entry.is_directory;

    assert_eq!(volume.count_media(Path::new("DCIM/Camera"), &is_file, 1).unwrap(), 1);
    assert_eq!(volume.count_media(Path::new("DCIM/Camera"), &is_file, 50).unwrap(), 2);
    assert_eq!(volume.round_trips(), 2);
}
