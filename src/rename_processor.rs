use std::io;

use crossbeam_channel::{select, Receiver, RecvError, Sender};
use dirwatch::RenameEvent;
use jod_thread::JoinHandle;

use crate::store::{RenameOutcome, SaveStore};

/// Moves saves after their package folder was renamed.
///
/// Owns a thread that consumes rename events from a channel, so the
/// directory watcher's worker never touches save files itself.
///
/// Dropping the processor signals the thread and waits for it to finish the
/// rename it is working on.
pub struct RenameProcessor {
    /// Controls the runtime of the processor thread. Signalled on drop.
    shutdown_sender: Sender<()>,

    /// Joined on drop.
    #[allow(unused)]
    job_thread: JoinHandle<Result<(), RecvError>>,
}

impl RenameProcessor {
    pub fn start(store: SaveStore, renames: Receiver<RenameEvent>) -> io::Result<Self> {
        let (shutdown_sender, shutdown_receiver) = crossbeam_channel::bounded(1);

        let job_thread = jod_thread::Builder::new()
            .name("RenameProcessor thread".to_owned())
            .spawn(move || {
                log::trace!("RenameProcessor thread started");

                loop {
                    select! {
                        recv(renames) -> event => {
                            let event = event?;
                            sync_rename(&store, &event.old_name, &event.new_name);
                        },
                        recv(shutdown_receiver) -> _ => {
                            log::trace!("RenameProcessor shutdown signal received...");
                            return Ok(());
                        },
                    }
                }
            })?;

        Ok(Self {
            shutdown_sender,
            job_thread,
        })
    }
}

impl Drop for RenameProcessor {
    fn drop(&mut self) {
        let _ = self.shutdown_sender.send(());
    }
}

/// Follows a package rename with its save. Failures are logged, never
/// returned: a missed rename only means the choices are forgotten.
pub fn sync_rename(store: &SaveStore, old_name: &str, new_name: &str) {
    log::debug!("Package renamed from '{}' to '{}'", old_name, new_name);

    match store.rename_save(old_name, new_name) {
        Ok(RenameOutcome::Moved { replaced }) => {
            if replaced {
                log::debug!("Replaced stale save of '{}'", new_name);
            }
            log::info!("Moved save of '{}' to '{}'", old_name, new_name);
        }
        Ok(RenameOutcome::Unchanged | RenameOutcome::NoSave) => {}
        Err(err) => log::error!(
            "Failed to move save of '{}' to '{}': {}",
            old_name,
            new_name,
            err
        ),
    }
}
