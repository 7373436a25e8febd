//! Rename watching on top of the `notify` crate, for platforms without
//! `ReadDirectoryChangesW`.
//!
//! Only complete rename events (both old and new path known) are consumed.
//! Half-renames, where an entry moved in or out of the directory, have no
//! counterpart on the other side and are ignored.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{select, Receiver, Sender};
use jod_thread::JoinHandle;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::{FailureBudget, RenameEvent, RenameHandler, WatchError, MAX_CONSECUTIVE_FAILURES};

type NotifyResult = notify::Result<notify::Event>;

pub(crate) struct Backend {
    /// Wakes the worker out of its wait. Bounded to one message so repeated
    /// stops never block.
    shutdown_sender: Sender<()>,

    job_thread: Option<JoinHandle<()>>,

    /// Kept alive for as long as we want events. Dropping it disconnects the
    /// worker's event channel.
    watcher: Option<RecommendedWatcher>,
}

impl Backend {
    pub(crate) fn start(
        path: &Path,
        mut on_rename: RenameHandler,
        running: Arc<AtomicBool>,
    ) -> Result<Self, WatchError> {
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();

        let mut watcher = notify::recommended_watcher(move |result: NotifyResult| {
            let _ = event_sender.send(result);
        })
        .map_err(|err| watch_error(path, err))?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|err| watch_error(path, err))?;

        let (shutdown_sender, shutdown_receiver) = crossbeam_channel::bounded(1);
        let watched = path.to_path_buf();
        let worker_running = running.clone();

        let job_thread = jod_thread::Builder::new()
            .name("dirwatch worker".to_owned())
            .spawn(move || {
                log::trace!("dirwatch worker started for '{}'", watched.display());
                run(&watched, &event_receiver, &shutdown_receiver, &mut on_rename);
                worker_running.store(false, Ordering::SeqCst);
            })
            .map_err(|err| {
                running.store(false, Ordering::SeqCst);
                WatchError::Spawn(err)
            })?;

        Ok(Self {
            shutdown_sender,
            job_thread: Some(job_thread),
            watcher: Some(watcher),
        })
    }

    pub(crate) fn stop(&mut self) {
        let _ = self.shutdown_sender.try_send(());

        if let Some(job_thread) = self.job_thread.take() {
            job_thread.join();
        }

        self.watcher.take();
    }
}

fn run(
    path: &Path,
    events: &Receiver<NotifyResult>,
    shutdown: &Receiver<()>,
    on_rename: &mut RenameHandler,
) {
    let mut budget = FailureBudget::new();

    loop {
        select! {
            recv(events) -> message => match message {
                Ok(Ok(event)) => {
                    budget.reset();
                    if let Some(rename) = rename_from_event(&event) {
                        log::debug!(
                            "Rename in '{}': '{}' -> '{}'",
                            path.display(),
                            rename.old_name,
                            rename.new_name
                        );
                        on_rename(rename);
                    }
                }
                Ok(Err(err)) => {
                    log::error!("Watching '{}' failed: {}", path.display(), err);
                    if budget.record_failure() {
                        log::error!(
                            "Giving up on watching '{}' after {} consecutive failures",
                            path.display(),
                            MAX_CONSECUTIVE_FAILURES
                        );
                        return;
                    }
                }
                Err(_) => return,
            },
            recv(shutdown) -> _ => {
                log::trace!("dirwatch worker for '{}' received stop signal", path.display());
                return;
            },
        }
    }
}

/// Converts a notify event into a rename of a directory inside the watched
/// directory, mirroring the directory-name-only filter of the Windows
/// backend.
fn rename_from_event(event: &notify::Event) -> Option<RenameEvent> {
    if !matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both))
    ) {
        return None;
    }

    let [from, to] = event.paths.as_slice() else {
        return None;
    };

    if !to.is_dir() {
        return None;
    }

    Some(RenameEvent {
        old_name: from.file_name()?.to_string_lossy().into_owned(),
        new_name: to.file_name()?.to_string_lossy().into_owned(),
    })
}

fn watch_error(path: &Path, err: notify::Error) -> WatchError {
    let path = path.to_path_buf();

    match err.kind {
        notify::ErrorKind::Io(source) => WatchError::Open { path, source },
        notify::ErrorKind::PathNotFound => WatchError::Open {
            path,
            source: io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
        },
        other => WatchError::Backend {
            path,
            error: format!("{:?}", other),
        },
    }
}
