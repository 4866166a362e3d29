//! # NextArc Core Library
//!
//! This crate provides the archive core for the NEXT archiver.
//!
//! It is designed to be driven by an out-of-tree presentation layer, but its
//! public API can also be used programmatically to create, extract, and
//! browse `.zip`, `.rar`, and `.narc` archives through one dispatch surface.
//!
//! ## Key Modules
//!
//! - [`narc`]: The NARC container codec, the archiver's native format.
//! - [`backend`]: Maps file extensions to codecs and their read/write capabilities.
//! - [`staging`]: The per-session staging area used to browse archive contents.
//! - [`listing`]: Runs extraction and indexing on a worker thread, delivering the index once.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nextarc::listing::ListingTask;
//! use nextarc::staging::StagingArea;
//!
//! # fn main() -> Result<(), nextarc::ArchiverError> {
//! let area = Arc::new(StagingArea::new()?);
//! let handle = ListingTask::spawn(Arc::clone(&area), "photos.zip".into())?;
//! let index = handle.wait()?;
//! for (path, staged_at) in index.iter() {
//!     println!("{} -> {}", path, staged_at.display());
//! }
//! if let Some(area) = Arc::into_inner(area) {
//!     area.shutdown();
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub use error::ArchiverError;

pub mod listing;
pub mod narc;
pub mod staging;

// Cross-platform filesystem helpers
pub mod fsx;
