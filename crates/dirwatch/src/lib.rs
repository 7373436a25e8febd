/*!
Watches a single directory for entries being renamed.

dirwatch reports `(old name, new name)` pairs for directories directly inside
a watched directory. Creation, deletion and content changes are not reported,
and subdirectories are not watched recursively.

## Backends
* Windows: a directory handle read with `ReadDirectoryChangesW`, with the raw
  notification buffer decoded by [`notify_record`]
* Other platforms: the `notify` crate, consuming only its paired rename
  events

Both backends run their wait loop on a dedicated worker thread and give up
after [`MAX_CONSECUTIVE_FAILURES`] failed reads in a row.
*/

pub mod notify_record;

#[cfg(not(windows))]
mod notify_backend;
#[cfg(windows)]
mod windows_backend;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{fmt, io};

use thiserror::Error;

#[cfg(not(windows))]
use notify_backend as backend;
#[cfg(windows)]
use windows_backend as backend;

pub use notify_record::{rename_pairs, NotifyAction, NotifyRecord, NotifyRecords, RenamePairs};

/// Number of failed reads in a row after which a watcher stops for good.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// An entry in the watched directory was renamed.
///
/// Names are bare entry names relative to the watched directory, not paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEvent {
    pub old_name: String,
    pub new_name: String,
}

/// Errors that prevent a watcher from starting.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to open '{}' for watching: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// The platform watching facility refused the directory.
    #[error("Failed to watch '{}': {error}", .path.display())]
    Backend { path: PathBuf, error: String },

    #[error("Failed to start watcher thread: {0}")]
    Spawn(#[source] io::Error),
}

/// A running watch on one directory.
///
/// Dropping the watcher stops it and waits for its worker to exit.
pub struct DirectoryWatcher {
    path: PathBuf,
    running: Arc<AtomicBool>,
    backend: backend::Backend,
}

impl DirectoryWatcher {
    /// Starts watching `path`, calling `on_rename` for every rename of an
    /// entry inside it.
    ///
    /// The directory is opened before this returns, so a missing or
    /// inaccessible directory is reported here instead of on the worker.
    /// `on_rename` runs on the watcher's worker thread; callers that need
    /// events somewhere else should forward them from the callback.
    pub fn watch<P, F>(path: P, on_rename: F) -> Result<Self, WatchError>
    where
        P: AsRef<Path>,
        F: FnMut(RenameEvent) + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let running = Arc::new(AtomicBool::new(true));
        let backend = backend::Backend::start(&path, Box::new(on_rename), running.clone())?;

        log::info!("Watching '{}' for renames", path.display());

        Ok(Self {
            path,
            running,
            backend,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the worker is still waiting for changes. Turns false once the
    /// watcher is stopped or has exhausted its failure budget.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Interrupts the pending wait and releases the directory. Safe to call
    /// more than once.
    pub fn stop(&mut self) {
        self.backend.stop();
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("path", &self.path)
            .field("running", &self.is_running())
            .finish()
    }
}

pub(crate) type RenameHandler = Box<dyn FnMut(RenameEvent) + Send + 'static>;

/// Counts consecutive failures. A success refills the budget.
pub(crate) struct FailureBudget {
    remaining: u32,
}

impl FailureBudget {
    pub(crate) fn new() -> Self {
        Self {
            remaining: MAX_CONSECUTIVE_FAILURES,
        }
    }

    /// Records one failure and returns `true` when the budget is used up.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    pub(crate) fn reset(&mut self) {
        self.remaining = MAX_CONSECUTIVE_FAILURES;
    }
}
