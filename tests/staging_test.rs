use nextarc::backend::{self, Backend};
use nextarc::listing::ListingTask;
use nextarc::staging::StagingArea;
use nextarc::ArchiverError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

/// Creates an archive of the given format holding the named files.
fn make_archive(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let src = dir.join(format!("src-{name}"));
    for (rel, content) in files {
        let path = src.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let inputs: Vec<PathBuf> = files.iter().map(|(rel, _)| src.join(rel)).collect();
    let archive = dir.join(name);
    backend::create_archive(Backend::for_path(&archive).unwrap(), &inputs, &archive).unwrap();
    archive
}

#[test]
fn prepare_for_indexes_every_staged_file() {
    let scratch = tempdir().unwrap();
    let archive = make_archive(
        scratch.path(),
        "first.narc",
        &[("notes.txt", b"hello"), ("logs.txt", b"world")],
    );

    let area = StagingArea::new().unwrap();
    let index = area.prepare_for(&archive).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.relative_paths(), vec!["logs.txt", "notes.txt"]);
    let staged = index.get("notes.txt").unwrap();
    assert!(staged.starts_with(area.root()));
    assert_eq!(fs::read(staged).unwrap(), b"hello");

    area.shutdown();
}

#[test]
fn successive_prepares_replace_the_index_wholesale() {
    let scratch = tempdir().unwrap();
    let a = make_archive(scratch.path(), "a.narc", &[("only_in_a.txt", b"aaa")]);
    let b = make_archive(scratch.path(), "b.zip", &[("only_in_b.txt", b"bbb")]);

    let area = StagingArea::new().unwrap();

    let index_a = area.prepare_for(&a).unwrap();
    assert_eq!(index_a.relative_paths(), vec!["only_in_a.txt"]);
    let stale_path = index_a.get("only_in_a.txt").unwrap().to_path_buf();

    let index_b = area.prepare_for(&b).unwrap();
    assert_eq!(index_b.relative_paths(), vec!["only_in_b.txt"]);
    assert!(index_b.get("only_in_a.txt").is_none());
    // The clear step removed A's staged bytes from disk
    assert!(!stale_path.exists());
    assert!(area.root().exists());

    area.shutdown();
}

#[test]
fn unsupported_extension_propagates_from_prepare_for() {
    let scratch = tempdir().unwrap();
    let bogus = scratch.path().join("notes.tar");
    fs::write(&bogus, b"whatever").unwrap();

    let area = StagingArea::new().unwrap();
    let err = area.prepare_for(&bogus).unwrap_err();
    assert!(matches!(err, ArchiverError::UnsupportedFormat(_)));
    area.shutdown();
}

#[test]
fn shutdown_removes_the_staging_tree() {
    let scratch = tempdir().unwrap();
    let archive = make_archive(scratch.path(), "gone.narc", &[("f.txt", b"f")]);

    let area = StagingArea::new().unwrap();
    let root = area.root().to_path_buf();
    area.prepare_for(&archive).unwrap();
    assert!(root.exists());

    area.shutdown();
    assert!(!root.exists());
}

#[test]
fn listing_task_delivers_the_index_once() {
    let scratch = tempdir().unwrap();
    let archive = make_archive(
        scratch.path(),
        "listed.zip",
        &[("x/one.txt", b"1"), ("x/two.txt", b"22")],
    );

    let area = Arc::new(StagingArea::new().unwrap());
    let handle = ListingTask::spawn(Arc::clone(&area), archive).unwrap();

    let index = handle.wait().unwrap();
    assert_eq!(index.relative_paths(), vec!["one.txt", "two.txt"]);
    assert_eq!(fs::read(index.get("two.txt").unwrap()).unwrap(), b"22");

    if let Some(area) = Arc::into_inner(area) {
        area.shutdown();
    }
}

#[test]
fn listing_task_surfaces_errors_unchanged() {
    let scratch = tempdir().unwrap();
    let bogus = scratch.path().join("broken.7z");
    fs::write(&bogus, b"x").unwrap();

    let area = Arc::new(StagingArea::new().unwrap());
    let handle = ListingTask::spawn(Arc::clone(&area), bogus).unwrap();
    let err = handle.wait().unwrap_err();
    assert!(matches!(err, ArchiverError::UnsupportedFormat(_)));

    if let Some(area) = Arc::into_inner(area) {
        area.shutdown();
    }
}

#[test]
fn sequential_listings_reflect_their_own_extraction() {
    let scratch = tempdir().unwrap();
    let a = make_archive(scratch.path(), "seq_a.narc", &[("a.txt", b"a")]);
    let b = make_archive(scratch.path(), "seq_b.narc", &[("b.txt", b"b")]);

    let area = Arc::new(StagingArea::new().unwrap());

    let first = ListingTask::spawn(Arc::clone(&area), a).unwrap().wait().unwrap();
    assert_eq!(first.relative_paths(), vec!["a.txt"]);

    let second = ListingTask::spawn(Arc::clone(&area), b).unwrap().wait().unwrap();
    assert_eq!(second.relative_paths(), vec!["b.txt"]);

    if let Some(area) = Arc::into_inner(area) {
        area.shutdown();
    }
}
