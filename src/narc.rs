//! # The NARC Container Format
//!
//! This module implements the "NARC" (Next ARC) container format, the native
//! format of the NEXT archiver.
//!
//! ## Format Specification
//!
//! A NARC container is a flat, write-once byte stream:
//!
//! 1.  **Magic**: the 7 ASCII bytes `b"NARC1.0"`.
//! 2.  **Entries**: a back-to-back sequence of
//!         `[u32 name_len] [name_len UTF-8 path bytes] [u64 size] [size raw bytes]`
//!     with both integers little-endian and paths forward-slash separated.
//!
//! There is no index, footer, or checksum; decoding is a sequential scan that
//! ends at a clean end-of-stream on an entry boundary. Entry data is stored
//! raw and uncompressed, so the declared size alone terminates each entry.
//!
//! Only regular files are represented. Empty directories and symlinks are not
//! preserved.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ArchiverError;

/// Magic marker opening every NARC container (version 1.0).
pub const NARC_MAGIC: &[u8; 7] = b"NARC1.0";

// 1 MiB copy chunks for entry payloads
const COPY_BUF_SIZE: usize = 1 << 20;

/// One logical file inside a container.
///
/// Constructed while enumerating sources for encoding and again while
/// decoding; not persisted independently of the container stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Forward-slash relative path, unique within one archive. Never contains
    /// `..` segments or an absolute prefix.
    pub relative_path: String,
    /// Exact byte count of the entry's content.
    pub size_bytes: u64,
}

/// Normalize an entry path: backslashes become forward slashes, a leading
/// `./` and doubled slashes are removed.
/// Example: "./dir1/dir2/file.txt" becomes "dir1/dir2/file.txt"
pub(crate) fn normalize_entry_path(path: &str) -> String {
    let s = path.replace('\\', "/");
    let trimmed = s.strip_prefix("./").unwrap_or(&s);
    trimmed.replace("//", "/")
}

/// Returns false for any normalized entry path that could land outside the
/// extraction root: absolute paths, drive-letter prefixes, `.`/`..` segments.
fn entry_path_is_safe(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') {
        return false;
    }
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        return false;
    }
    path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

fn format_err(reason: impl Into<String>) -> ArchiverError {
    ArchiverError::Format { path: PathBuf::new(), reason: reason.into() }
}

/// Enumerates every entry the given sources contribute, in input order.
///
/// A plain file becomes one entry named by its file name. A directory
/// contributes every regular file beneath it, with paths computed relative to
/// the directory's *parent*, so the directory's own name stays as the top
/// path segment.
pub(crate) fn enumerate_sources(
    inputs: &[PathBuf],
) -> Result<Vec<(PathBuf, ArchiveEntry)>, ArchiverError> {
    let mut sources = Vec::new();
    for input in inputs {
        let meta = fs::metadata(input)
            .map_err(|source| ArchiverError::Io { source, path: input.clone() })?;
        let anchor = input.parent().unwrap_or_else(|| Path::new("")).to_path_buf();

        if meta.is_file() {
            let rel = input
                .strip_prefix(&anchor)
                .map_err(|_| ArchiverError::StripPrefix { prefix: anchor.clone(), path: input.clone() })?;
            sources.push((
                input.clone(),
                ArchiveEntry {
                    relative_path: normalize_entry_path(&rel.to_string_lossy()),
                    size_bytes: meta.len(),
                },
            ));
            continue;
        }

        for entry in WalkDir::new(input) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&anchor)
                .map_err(|_| ArchiverError::StripPrefix {
                    prefix: anchor.clone(),
                    path: entry.path().to_path_buf(),
                })?;
            let file_meta = entry.metadata()?;
            sources.push((
                entry.path().to_path_buf(),
                ArchiveEntry {
                    relative_path: normalize_entry_path(&rel.to_string_lossy()),
                    size_bytes: file_meta.len(),
                },
            ));
        }
    }
    Ok(sources)
}

/// Creates a NARC container at `output` holding every file reachable from
/// `inputs`. All sources are encoded, in the order given.
pub fn pack(inputs: &[PathBuf], output: &Path) -> Result<(), ArchiverError> {
    let file = File::create(output)
        .map_err(|source| ArchiverError::Io { source, path: output.to_path_buf() })?;
    // 8 MiB buffer to reduce syscall overhead while streaming entry data
    let mut writer = BufWriter::with_capacity(8 * 1024 * 1024, file);
    let count = pack_into(inputs, &mut writer)?;
    writer
        .flush()
        .map_err(|source| ArchiverError::Io { source, path: output.to_path_buf() })?;
    tracing::debug!(entries = count, output = %output.display(), "packed NARC container");
    Ok(())
}

/// Stream-level encode: writes the magic and every entry from `inputs` into
/// `dest`. Returns the number of entries written.
pub fn pack_into<W: Write>(inputs: &[PathBuf], dest: &mut W) -> Result<u64, ArchiverError> {
    dest.write_all(NARC_MAGIC)?;

    let sources = enumerate_sources(inputs)?;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut count = 0u64;

    for (abs_path, entry) in sources {
        dest.write_all(&(entry.relative_path.len() as u32).to_le_bytes())?;
        dest.write_all(entry.relative_path.as_bytes())?;
        dest.write_all(&entry.size_bytes.to_le_bytes())?;

        let file = File::open(&abs_path)
            .map_err(|source| ArchiverError::Io { source, path: abs_path.clone() })?;
        let mut reader = BufReader::new(file);
        let mut remaining = entry.size_bytes;
        while remaining > 0 {
            let want = remaining.min(COPY_BUF_SIZE as u64) as usize;
            let n = reader
                .read(&mut buf[..want])
                .map_err(|source| ArchiverError::Io { source, path: abs_path.clone() })?;
            if n == 0 {
                return Err(ArchiverError::Io {
                    source: io::Error::new(io::ErrorKind::UnexpectedEof, "source file shrank while packing"),
                    path: abs_path.clone(),
                });
            }
            dest.write_all(&buf[..n])?;
            remaining -= n as u64;
        }
        count += 1;
    }
    Ok(count)
}

/// Reads the next entry's 4-byte name length. A clean end-of-stream here is
/// the normal termination condition and yields `None`; a partial read is a
/// truncated container.
fn read_name_len<R: Read>(reader: &mut R) -> Result<Option<u32>, ArchiverError> {
    let mut bytes = [0u8; 4];
    let mut filled = 0;
    while filled < bytes.len() {
        let n = reader.read(&mut bytes[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(format_err("truncated entry header"));
        }
        filled += n;
    }
    Ok(Some(u32::from_le_bytes(bytes)))
}

/// Decodes the NARC container at `archive` into `dest`, returning every
/// materialized entry in stream order.
pub fn unpack(archive: &Path, dest: &Path) -> Result<Vec<ArchiveEntry>, ArchiverError> {
    let file = File::open(archive)
        .map_err(|source| ArchiverError::Io { source, path: archive.to_path_buf() })?;
    let mut reader = BufReader::new(file);
    let entries = unpack_from(&mut reader, dest).map_err(|e| e.with_path(archive))?;
    tracing::debug!(entries = entries.len(), archive = %archive.display(), "unpacked NARC container");
    Ok(entries)
}

/// Stream-level decode. Validates the magic, then materializes entries under
/// `dest` until a clean end-of-stream. Decoding the same stream into the same
/// destination twice overwrites identically.
pub fn unpack_from<R: Read>(reader: &mut R, dest: &Path) -> Result<Vec<ArchiveEntry>, ArchiverError> {
    let mut magic = [0u8; NARC_MAGIC.len()];
    reader.read_exact(&mut magic).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            format_err("stream too short to hold the NARC magic")
        } else {
            ArchiverError::from(source)
        }
    })?;
    if &magic != NARC_MAGIC {
        return Err(format_err("invalid NARC magic"));
    }

    let mut materialized = Vec::new();
    let mut buf = vec![0u8; COPY_BUF_SIZE];

    while let Some(name_len) = read_name_len(reader)? {
        let mut name_bytes = vec![0u8; name_len as usize];
        reader.read_exact(&mut name_bytes).map_err(|source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                format_err("entry name runs past end of stream")
            } else {
                ArchiverError::from(source)
            }
        })?;
        let name = String::from_utf8(name_bytes)
            .map_err(|_| format_err("entry name is not valid UTF-8"))?;

        let rel_path = normalize_entry_path(&name);
        if !entry_path_is_safe(&rel_path) {
            return Err(format_err(format!("entry path '{}' escapes the destination", name)));
        }

        let mut size_bytes = [0u8; 8];
        reader.read_exact(&mut size_bytes).map_err(|source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                format_err("entry size field runs past end of stream")
            } else {
                ArchiverError::from(source)
            }
        })?;
        let size = u64::from_le_bytes(size_bytes);

        let out_path = rel_path.split('/').fold(dest.to_path_buf(), |p, seg| p.join(seg));
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ArchiverError::Io { source, path: parent.to_path_buf() })?;
        }
        let out_file = File::create(&out_path)
            .map_err(|source| ArchiverError::Io { source, path: out_path.clone() })?;
        let mut writer = BufWriter::new(out_file);

        let mut remaining = size;
        while remaining > 0 {
            let want = remaining.min(COPY_BUF_SIZE as u64) as usize;
            let n = reader.read(&mut buf[..want])?;
            if n == 0 {
                return Err(format_err(format!(
                    "entry '{}' declares {} bytes but the stream ends early",
                    rel_path, size
                )));
            }
            writer
                .write_all(&buf[..n])
                .map_err(|source| ArchiverError::Io { source, path: out_path.clone() })?;
            remaining -= n as u64;
        }
        writer
            .flush()
            .map_err(|source| ArchiverError::Io { source, path: out_path.clone() })?;

        materialized.push(ArchiveEntry { relative_path: rel_path, size_bytes: size });
    }
    Ok(materialized)
}
