use std::path::PathBuf;

use crate::backend::ArchiveFormat;

/// The primary error type for all operations in the `nextarc` crate.
#[derive(Debug)]
pub enum ArchiverError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    Io { source: std::io::Error, path: PathBuf },

    /// The archive content is malformed: bad magic, a truncated entry, a
    /// declared length running past end of stream, or an entry path that
    /// would escape the destination directory.
    Format { path: PathBuf, reason: String },

    /// The file extension does not match any registered backend.
    UnsupportedFormat(String),

    /// The resolved backend is read-only and cannot create archives.
    WriteNotSupported(ArchiveFormat),

    /// An error occurred when trying to strip a prefix from a file path.
    StripPrefix { prefix: PathBuf, path: PathBuf },
}

impl std::fmt::Display for ArchiverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiverError::Io { source, path } => write!(f, "I/O error on path '{}': {}", path.display(), source),
            ArchiverError::Format { path, reason } => write!(f, "Malformed archive '{}': {}", path.display(), reason),
            ArchiverError::UnsupportedFormat(ext) => write!(f, "Unsupported archive format: '{}'", ext),
            ArchiverError::WriteNotSupported(format) => write!(f, "Creating {} archives is not supported", format),
            ArchiverError::StripPrefix { prefix, path } => write!(f, "Could not strip prefix '{}' from path '{}'", prefix.display(), path.display()),
        }
    }
}

impl std::error::Error for ArchiverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiverError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// Generic IO error conversion that doesn't require a path
impl From<std::io::Error> for ArchiverError {
    fn from(err: std::io::Error) -> Self {
        ArchiverError::Io { source: err, path: PathBuf::new() }
    }
}

impl From<walkdir::Error> for ArchiverError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => ArchiverError::Io { source, path },
            None => ArchiverError::Io {
                source: std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"),
                path,
            },
        }
    }
}

impl From<zip::result::ZipError> for ArchiverError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => ArchiverError::Io { source, path: PathBuf::new() },
            other => ArchiverError::Format { path: PathBuf::new(), reason: other.to_string() },
        }
    }
}

impl ArchiverError {
    /// Attaches a concrete path to a path-less `Io` or `Format` error,
    /// leaving every other variant untouched.
    pub(crate) fn with_path(self, p: &std::path::Path) -> Self {
        match self {
            ArchiverError::Io { source, path } if path.as_os_str().is_empty() => {
                ArchiverError::Io { source, path: p.to_path_buf() }
            }
            ArchiverError::Format { path, reason } if path.as_os_str().is_empty() => {
                ArchiverError::Format { path: p.to_path_buf(), reason }
            }
            other => other,
        }
    }
}
