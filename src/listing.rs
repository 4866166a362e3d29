//! # Background Listing Task
//!
//! Browsing an archive means extracting it into the staging area and walking
//! the result — blocking work that must stay off the interactive thread. The
//! listing task runs [`StagingArea::prepare_for`] on one auxiliary worker per
//! invocation (no pool; invocations are not expected to overlap) and delivers
//! the outcome back exactly once, through a handle the caller either blocks
//! on or polls.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use crate::staging::{StagingArea, StagingIndex};
use crate::ArchiverError;

/// Spawns listing workers. The unit struct keeps the spawn entry point
/// discoverable next to [`ListingHandle`].
pub struct ListingTask;

impl ListingTask {
    /// Starts one worker that stages `archive` and returns immediately with
    /// the handle to its eventual result.
    ///
    /// Concurrent invocations are serialized by the staging area's guard, but
    /// each call still clears the shared staging directory — callers should
    /// collect one listing before starting the next, or the earlier index
    /// will describe files the later call deleted.
    pub fn spawn(area: Arc<StagingArea>, archive: PathBuf) -> Result<ListingHandle, ArchiverError> {
        // capacity 1 → the worker's single send can never block
        let (tx, rx) = bounded(1);
        let worker = thread::Builder::new()
            .name("nextarc-listing".into())
            .spawn(move || {
                tracing::debug!(archive = %archive.display(), "listing worker started");
                let outcome = area.prepare_for(&archive);
                let _ = tx.send(outcome);
            })?;
        Ok(ListingHandle { rx, worker })
    }
}

/// Single-shot handle to a running listing. The result — index or error — is
/// retrieved exactly once by consuming the handle.
pub struct ListingHandle {
    rx: Receiver<Result<StagingIndex, ArchiverError>>,
    worker: thread::JoinHandle<()>,
}

impl ListingHandle {
    /// True once the worker has published its result; `wait` will no longer
    /// block.
    pub fn is_finished(&self) -> bool {
        !self.rx.is_empty() || self.worker.is_finished()
    }

    /// Blocks until the worker completes and returns its index, computed from
    /// the staging state this invocation's own extraction produced.
    ///
    /// A worker panic resumes on the calling thread rather than being folded
    /// into the error taxonomy.
    pub fn wait(self) -> Result<StagingIndex, ArchiverError> {
        let outcome = self.rx.recv();
        if let Err(panic) = self.worker.join() {
            std::panic::resume_unwind(panic);
        }
        match outcome {
            Ok(result) => result,
            Err(_) => Err(ArchiverError::from(std::io::Error::new(
                std::io::ErrorKind::Other,
                "listing worker exited without delivering a result",
            ))),
        }
    }
}
