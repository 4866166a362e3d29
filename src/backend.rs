//! # Format Backend Registry
//!
//! One capability-bearing descriptor per supported archive extension, plus
//! the dispatch that routes create/extract calls to the matching codec.
//!
//! The supported set is closed: ZIP (read/write, external `zip` codec), RAR
//! (read-only, external `unrar` codec), and NARC (read/write, [`crate::narc`]).
//! Extensions resolve case-insensitively against a fixed table built once at
//! compile time; anything else is an [`ArchiverError::UnsupportedFormat`]
//! condition the caller is expected to surface to the user, not a fatal one.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::FileOptions;

use crate::narc;
use crate::ArchiverError;

/// The closed set of archive formats the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Rar,
    Narc,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "ZIP"),
            ArchiveFormat::Rar => write!(f, "RAR"),
            ArchiveFormat::Narc => write!(f, "NARC"),
        }
    }
}

/// Static descriptor for one registered extension: the codec it routes to
/// and what that codec is capable of.
#[derive(Debug)]
pub struct Backend {
    pub format: ArchiveFormat,
    pub extension: &'static str,
    pub can_read: bool,
    pub can_write: bool,
}

static BACKENDS: [Backend; 3] = [
    Backend { format: ArchiveFormat::Zip, extension: "zip", can_read: true, can_write: true },
    Backend { format: ArchiveFormat::Rar, extension: "rar", can_read: true, can_write: false },
    Backend { format: ArchiveFormat::Narc, extension: "narc", can_read: true, can_write: true },
];

impl Backend {
    /// Resolves a backend by extension token, case-insensitively, with or
    /// without the leading dot.
    pub fn for_extension(ext: &str) -> Result<&'static Backend, ArchiverError> {
        let token = ext.strip_prefix('.').unwrap_or(ext);
        BACKENDS
            .iter()
            .find(|b| b.extension.eq_ignore_ascii_case(token))
            .ok_or_else(|| ArchiverError::UnsupportedFormat(ext.to_string()))
    }

    /// Resolves a backend from a file path's extension.
    pub fn for_path(path: &Path) -> Result<&'static Backend, ArchiverError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Backend::for_extension(ext),
            None => Err(ArchiverError::UnsupportedFormat(path.to_string_lossy().into_owned())),
        }
    }
}

/// Creates an archive at `output` from `inputs` using the backend's codec.
///
/// Fails with [`ArchiverError::WriteNotSupported`] before touching the
/// filesystem when the backend is read-only; the caller decides whether to
/// offer a writable format instead, the registry never substitutes one.
pub fn create_archive(backend: &Backend, inputs: &[PathBuf], output: &Path) -> Result<(), ArchiverError> {
    if !backend.can_write {
        return Err(ArchiverError::WriteNotSupported(backend.format));
    }
    match backend.format {
        ArchiveFormat::Zip => write_zip(inputs, output),
        ArchiveFormat::Narc => narc::pack(inputs, output),
        ArchiveFormat::Rar => Err(ArchiverError::WriteNotSupported(ArchiveFormat::Rar)),
    }
}

/// Extracts every entry of `archive` into `dest` using the backend's codec.
///
/// The external ZIP and RAR codecs perform their own entry-path sanitization;
/// NARC extraction enforces it in [`crate::narc`].
pub fn extract_archive(backend: &Backend, archive: &Path, dest: &Path) -> Result<(), ArchiverError> {
    match backend.format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::Rar => extract_rar(archive, dest),
        ArchiveFormat::Narc => narc::unpack(archive, dest).map(|_| ()),
    }
}

fn write_zip(inputs: &[PathBuf], output: &Path) -> Result<(), ArchiverError> {
    let file = File::create(output)
        .map_err(|source| ArchiverError::Io { source, path: output.to_path_buf() })?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (abs_path, entry) in narc::enumerate_sources(inputs)? {
        writer
            .start_file(entry.relative_path, options)
            .map_err(|e| ArchiverError::from(e).with_path(output))?;
        let mut reader = File::open(&abs_path)
            .map_err(|source| ArchiverError::Io { source, path: abs_path.clone() })?;
        io::copy(&mut reader, &mut writer)
            .map_err(|source| ArchiverError::Io { source, path: abs_path.clone() })?;
    }
    writer.finish().map_err(|e| ArchiverError::from(e).with_path(output))?;
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ArchiverError> {
    let file = File::open(archive)
        .map_err(|source| ArchiverError::Io { source, path: archive.to_path_buf() })?;
    let mut zip_archive =
        zip::ZipArchive::new(file).map_err(|e| ArchiverError::from(e).with_path(archive))?;
    zip_archive
        .extract(dest)
        .map_err(|e| ArchiverError::from(e).with_path(archive))?;
    Ok(())
}

fn rar_err(err: unrar::error::UnrarError, archive: &Path) -> ArchiverError {
    ArchiverError::Format { path: archive.to_path_buf(), reason: err.to_string() }
}

fn extract_rar(archive: &Path, dest: &Path) -> Result<(), ArchiverError> {
    // Surface a missing archive as a plain I/O error instead of an unrar code
    fs::metadata(archive)
        .map_err(|source| ArchiverError::Io { source, path: archive.to_path_buf() })?;

    let mut rar = unrar::Archive::new(archive)
        .open_for_processing()
        .map_err(|e| rar_err(e, archive))?;
    while let Some(header) = rar.read_header().map_err(|e| rar_err(e, archive))? {
        rar = if header.entry().is_file() {
            header.extract_with_base(dest).map_err(|e| rar_err(e, archive))?
        } else {
            header.skip().map_err(|e| rar_err(e, archive))?
        };
    }
    Ok(())
}
