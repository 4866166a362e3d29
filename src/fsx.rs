//! Cross-platform filesystem helpers.
//!
//! The staging directory is a dot-prefixed temp directory, which hides it on
//! Unix by convention; on Windows the hidden attribute has to be set
//! explicitly. Hiding is a presentation nicety, never a correctness
//! requirement, so `mark_hidden` is best-effort on every platform.

use std::fs;
use std::io;
use std::path::Path;

/// Removes every child of `dir` without removing the directory itself.
pub fn clear_dir_contents(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(target_os = "windows")]
/// Set the hidden attribute on Windows via `attrib +h`.
pub fn mark_hidden(path: &Path) {
    if let Err(e) = std::process::Command::new("attrib").arg("+h").arg(path).status() {
        tracing::warn!(error = %e, path = %path.display(), "could not mark directory hidden");
    }
}

#[cfg(not(target_os = "windows"))]
/// No-op outside Windows: a dot-prefixed directory name is already hidden.
pub fn mark_hidden(_path: &Path) {}
