//! # Staging Area
//!
//! Owns the one ephemeral directory a session uses to browse archive
//! contents. `prepare_for` clears it, extracts the requested archive into it
//! through the backend registry, and walks the result into a fresh
//! [`StagingIndex`]; the previous index is replaced wholesale, never merged.
//!
//! The staging directory and its contents are the only mutable shared state
//! in the core. Only this module writes to it, and a mutex owned by the area
//! serializes `prepare_for` calls, so exactly one extraction is ever in
//! flight. Collaborators holding an old index must discard it once a new
//! `prepare_for` runs — its absolute paths point at deleted files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::backend::{self, Backend};
use crate::fsx;
use crate::ArchiverError;

/// Immutable snapshot mapping each staged entry's archive-relative path to
/// the absolute location holding its bytes.
///
/// Iteration order is sorted by relative path, ready for display.
#[derive(Debug, Clone, Default)]
pub struct StagingIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl StagingIndex {
    /// Absolute staged location of one entry, if present.
    pub fn get(&self, relative_path: &str) -> Option<&Path> {
        self.entries.get(relative_path).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(rel, abs)| (rel.as_str(), abs.as_path()))
    }

    /// The sorted relative paths of every staged entry.
    pub fn relative_paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The session-scoped staging directory and its single-extraction guard.
pub struct StagingArea {
    root: TempDir,
    guard: Mutex<()>,
}

impl StagingArea {
    /// Creates the session's staging directory: a hidden scratch directory
    /// under the system temp location.
    pub fn new() -> Result<Self, ArchiverError> {
        let root = tempfile::Builder::new().prefix(".nextarc-staging-").tempdir()?;
        fsx::mark_hidden(root.path());
        tracing::debug!(root = %root.path().display(), "staging area created");
        Ok(Self { root, guard: Mutex::new(()) })
    }

    /// The staging root. Collaborators may display it but must not write to
    /// it; the area owns every byte underneath.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Clears the staging directory, extracts `archive` into it, and indexes
    /// the materialized tree.
    ///
    /// The clear step is destructive with no undo: any index from an earlier
    /// call is invalid as soon as this one begins.
    pub fn prepare_for(&self, archive: &Path) -> Result<StagingIndex, ArchiverError> {
        let _guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        fsx::clear_dir_contents(self.root.path())
            .map_err(|source| ArchiverError::Io { source, path: self.root.path().to_path_buf() })?;

        let backend = Backend::for_path(archive)?;
        backend::extract_archive(backend, archive, self.root.path())?;

        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(self.root.path()) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(self.root.path()).map_err(|_| {
                ArchiverError::StripPrefix {
                    prefix: self.root.path().to_path_buf(),
                    path: entry.path().to_path_buf(),
                }
            })?;
            let key = rel.to_string_lossy().replace('\\', "/");
            entries.insert(key, entry.path().to_path_buf());
        }

        tracing::info!(
            archive = %archive.display(),
            entries = entries.len(),
            "archive staged for browsing"
        );
        Ok(StagingIndex { entries })
    }

    /// Deletes the staging tree. Best-effort: failures are logged and
    /// swallowed so shutdown never blocks process exit. Dropping the area
    /// without calling this cleans up the same way.
    pub fn shutdown(self) {
        if let Err(e) = self.root.close() {
            tracing::warn!(error = %e, "failed to remove staging directory");
        }
    }
}
