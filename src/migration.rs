//! Folds saves from older on-disk generations into the current one.
//!
//! Each legacy root is handled on its own: it is backed up to a sibling
//! `<root>_backup` folder, then every save inside it is either moved to its
//! current-generation path or, when the current file is at least as new,
//! deleted. Exactly one file survives per package.

use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use thiserror::Error;
use walkdir::WalkDir;

use crate::{
    layout::{escape_file_name, SaveLayout, SAVE_EXTENSION},
    store::move_file,
};

/// A folder holding saves from an older generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRoot {
    pub path: PathBuf,
    pub generation: &'static str,
}

impl LegacyRoot {
    pub fn new<P: Into<PathBuf>>(path: P, generation: &'static str) -> Self {
        Self {
            path: path.into(),
            generation,
        }
    }

    /// Sibling folder the root is copied into before anything is touched.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push("_backup");
        PathBuf::from(name)
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Could not back up '{}' into '{}': {source}", root.display(), backup.display())]
    Backup {
        root: PathBuf,
        backup: PathBuf,
        source: io::Error,
    },

    #[error("Could not walk '{}': {source}", root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },

    #[error("Could not migrate '{}': {source}", path.display())]
    File { path: PathBuf, source: io::Error },
}

/// How a legacy root fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus {
    /// No saves were found, nothing was touched.
    Skipped,
    /// The backup failed, so none of the root's saves were touched.
    Aborted,
    /// Every save in the root was visited.
    Migrated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub generation: &'static str,
    pub root: PathBuf,
    pub status: RootStatus,
    /// Saves moved into the current generation.
    pub moved: usize,
    /// Saves deleted because the current generation already had a newer one.
    pub discarded: usize,
    /// Saves left in place after an error.
    pub failed: usize,
}

impl MigrationReport {
    fn new(root: &LegacyRoot, status: RootStatus) -> Self {
        Self {
            generation: root.generation,
            root: root.path.clone(),
            status,
            moved: 0,
            discarded: 0,
            failed: 0,
        }
    }
}

enum FileOutcome {
    Moved,
    Discarded,
}

/// Moves legacy saves into a current-generation folder.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    current_root: PathBuf,
}

impl MigrationEngine {
    pub fn new<P: Into<PathBuf>>(current_root: P) -> Self {
        Self {
            current_root: current_root.into(),
        }
    }

    /// Migrates every root, in order. Failures are logged and counted in the
    /// reports; none of them stop the remaining roots or files.
    pub fn run(&self, legacy_roots: &[LegacyRoot]) -> Vec<MigrationReport> {
        legacy_roots
            .iter()
            .map(|root| self.migrate_root(root))
            .collect()
    }

    fn migrate_root(&self, root: &LegacyRoot) -> MigrationReport {
        log::debug!(
            "Looking for {} saves in '{}'",
            root.generation,
            root.path.display()
        );

        let legacy_saves = match find_saves(&root.path) {
            Ok(saves) => saves,
            Err(err) => {
                log::error!("{}", err);
                return MigrationReport::new(root, RootStatus::Aborted);
            }
        };

        if legacy_saves.is_empty() {
            log::debug!("No {} saves found, skipping", root.generation);
            return MigrationReport::new(root, RootStatus::Skipped);
        }

        log::info!(
            "Found {} {} saves, migrating them to '{}'",
            legacy_saves.len(),
            root.generation,
            self.current_root.display()
        );

        let backup = root.backup_path();
        if let Err(source) = copy_tree(&root.path, &backup) {
            let err = MigrationError::Backup {
                root: root.path.clone(),
                backup,
                source,
            };
            log::error!("{}, leaving {} saves untouched", err, root.generation);
            return MigrationReport::new(root, RootStatus::Aborted);
        }
        log::info!("Backed up {} saves into '{}'", root.generation, backup.display());

        let mut report = MigrationReport::new(root, RootStatus::Migrated);

        for legacy_path in legacy_saves {
            match self.migrate_file(&legacy_path) {
                Ok(FileOutcome::Moved) => report.moved += 1,
                Ok(FileOutcome::Discarded) => report.discarded += 1,
                Err(err) => {
                    log::error!("{}", err);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Migrated {} saves from '{}': {} moved, {} discarded as outdated, {} failed",
            root.generation,
            root.path.display(),
            report.moved,
            report.discarded,
            report.failed
        );

        report
    }

    fn migrate_file(&self, legacy_path: &Path) -> Result<FileOutcome, MigrationError> {
        let file_error = |source| MigrationError::File {
            path: legacy_path.to_path_buf(),
            source,
        };

        let destination = self.destination_for(legacy_path);
        let legacy_modified = modified_time(legacy_path).map_err(file_error)?;
        let current_modified = if destination.exists() {
            modified_time(&destination).map_err(file_error)?
        } else {
            SystemTime::UNIX_EPOCH
        };

        if current_modified >= legacy_modified {
            log::debug!(
                "'{}' is not newer than '{}', deleting it",
                legacy_path.display(),
                destination.display()
            );
            fs_err::remove_file(legacy_path).map_err(file_error)?;
            return Ok(FileOutcome::Discarded);
        }

        fs_err::create_dir_all(&self.current_root).map_err(file_error)?;
        move_file(legacy_path, &destination).map_err(file_error)?;
        log::debug!(
            "Moved '{}' to '{}'",
            legacy_path.display(),
            destination.display()
        );

        Ok(FileOutcome::Moved)
    }

    /// Saves are named after their package in every generation, so the
    /// package name is recovered from the file stem.
    fn destination_for(&self, legacy_path: &Path) -> PathBuf {
        let package_name = legacy_path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();

        self.current_root.join(format!(
            "{}.{}",
            escape_file_name(&package_name),
            SAVE_EXTENSION
        ))
    }
}

/// Migrates every legacy generation of a layout into its current folder.
pub fn migrate(layout: &SaveLayout) -> Vec<MigrationReport> {
    MigrationEngine::new(layout.saves_v3_folder()).run(&layout.legacy_roots())
}

/// All save files under `root`. A root that does not exist has none.
fn find_saves(root: &Path) -> Result<Vec<PathBuf>, MigrationError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut saves = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| MigrationError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        let is_save = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|extension| extension == SAVE_EXTENSION);

        if is_save {
            saves.push(entry.into_path());
        }
    }

    Ok(saves)
}

/// Recursively copies `from` into `to`, merging with whatever `to` already
/// holds. Files present in both are overwritten.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs_err::create_dir_all(&target)?;
        } else {
            fs_err::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs_err::metadata(path)?.modified()
}
