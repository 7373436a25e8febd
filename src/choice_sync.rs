use std::{path::Path, sync::Arc};

use dirwatch::DirectoryWatcher;

use crate::{
    layout::SaveLayout,
    migration::{self, MigrationReport},
    rename_processor::{sync_rename, RenameProcessor},
    session::InstallerSession,
    settings::Settings,
    store::SaveStore,
};

/// Keeps saves in step with the packages they belong to.
///
/// Starting it migrates legacy saves, then follows renames of package
/// folders in the mods directory for as long as it lives. It also owns the
/// installer session of the dialog currently open, if any.
pub struct ChoiceSync {
    settings: Arc<Settings>,
    store: SaveStore,
    migration_reports: Vec<MigrationReport>,
    session: Option<InstallerSession>,

    // Declared before the processor so it is dropped first: the watcher's
    // worker feeds the processor's channel.
    watcher: Option<DirectoryWatcher>,

    #[allow(unused)]
    processor: Option<RenameProcessor>,
}

impl ChoiceSync {
    /// Migrates legacy saves and starts watching `mods_dir` for renames.
    ///
    /// Never fails. If the mods directory cannot be watched the error is
    /// logged and saves simply stop following renames.
    pub fn start(settings: Settings, layout: SaveLayout, mods_dir: &Path) -> Self {
        let migration_reports = migration::migrate(&layout);
        let store = SaveStore::new(layout);

        let (rename_sender, rename_receiver) = crossbeam_channel::unbounded();

        let processor = match RenameProcessor::start(store.clone(), rename_receiver) {
            Ok(processor) => Some(processor),
            Err(err) => {
                log::error!("Could not start rename processing: {}", err);
                None
            }
        };

        let watcher = processor.as_ref().and_then(|_| {
            let watched = DirectoryWatcher::watch(mods_dir, move |event| {
                let _ = rename_sender.send(event);
            });

            match watched {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    log::error!("{}, saves will not follow renamed packages", err);
                    None
                }
            }
        });

        Self {
            settings: Arc::new(settings),
            store,
            migration_reports,
            session: None,
            watcher,
            processor,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    pub fn migration_reports(&self) -> &[MigrationReport] {
        &self.migration_reports
    }

    /// Whether renames in the mods directory are being followed.
    pub fn is_watching(&self) -> bool {
        self.watcher
            .as_ref()
            .is_some_and(|watcher| watcher.is_running())
    }

    /// Moves a package's save after the package was renamed.
    pub fn handle_rename(&self, old_name: &str, new_name: &str) {
        sync_rename(&self.store, old_name, new_name);
    }

    /// Starts tracking a newly opened installer dialog, replacing any session
    /// still open. Returns `None` when tracking is disabled in the settings.
    pub fn open_session(&mut self) -> Option<&mut InstallerSession> {
        if !self.settings.enabled {
            log::debug!("Installer tracking is disabled, not opening a session");
            return None;
        }

        if self.session.is_some() {
            log::debug!("Replacing the previous installer session");
        }

        let session = InstallerSession::new(self.store.clone(), self.settings.clone());
        Some(self.session.insert(session))
    }

    pub fn session_mut(&mut self) -> Option<&mut InstallerSession> {
        self.session.as_mut()
    }

    pub fn close_session(&mut self) -> Option<InstallerSession> {
        self.session.take()
    }
}
