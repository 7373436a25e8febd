//! Reading and writing current-generation save files.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    layout::SaveLayout,
    save::{Save, SaveError},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Could not write save '{}': {source}", path.display())]
    Encode { path: PathBuf, source: SaveError },

    #[error("Could not move new save into place at '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

/// What [`SaveStore::rename_save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Old and new names map to the same save.
    Unchanged,
    /// Nothing was saved under the old name.
    NoSave,
    /// The save now lives under the new name. `replaced` tells whether a
    /// stale save under the new name was thrown away.
    Moved { replaced: bool },
}

/// Current-generation saves for one game.
#[derive(Debug, Clone)]
pub struct SaveStore {
    layout: SaveLayout,
}

impl SaveStore {
    pub fn new(layout: SaveLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SaveLayout {
        &self.layout
    }

    pub fn save_path(&self, package_name: &str) -> PathBuf {
        self.layout.save_path(package_name)
    }

    /// Loads the save for a package.
    ///
    /// Returns `None` when there is no save, and also when the save cannot be
    /// read or parsed; a broken save is treated as no save at all.
    pub fn load(&self, package_name: &str) -> Option<Save> {
        let path = self.save_path(package_name);

        let contents = match fs_err::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    "No save for '{}', expected it at '{}'",
                    package_name,
                    path.display()
                );
                return None;
            }
            Err(err) => {
                log::error!("{}", err);
                return None;
            }
        };

        match Save::from_slice(&contents) {
            Ok(save) => {
                log::debug!("Loaded save for '{}' from '{}'", package_name, path.display());
                Some(save)
            }
            Err(err) => {
                log::error!("Ignoring save at '{}': {}", path.display(), err);
                None
            }
        }
    }

    /// Writes the save for a package, replacing any previous one.
    ///
    /// The file is written next to its destination and then renamed over
    /// it, so a concurrent reader sees either the old save or the new one.
    pub fn persist(&self, package_name: &str, save: &Save) -> Result<PathBuf, StoreError> {
        let path = self.save_path(package_name);
        let encoded = save.to_vec_pretty().map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs_err::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&encoded)?;
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(&path)
            .map_err(|source| StoreError::Persist {
                path: path.clone(),
                source,
            })?;

        log::debug!("Saved choices for '{}' into '{}'", package_name, path.display());
        Ok(path)
    }

    /// Moves the save of a package that was renamed from `old_name` to
    /// `new_name`.
    ///
    /// A save already stored under `new_name` is deleted first: the renamed
    /// package's save supersedes it.
    pub fn rename_save(&self, old_name: &str, new_name: &str) -> Result<RenameOutcome, StoreError> {
        let old_path = self.save_path(old_name);
        let new_path = self.save_path(new_name);

        // Names that escape to the same file name share one save.
        if old_path == new_path {
            return Ok(RenameOutcome::Unchanged);
        }

        if !old_path.is_file() {
            return Ok(RenameOutcome::NoSave);
        }

        // On case-insensitive filesystems a rename that only changes case
        // leaves both paths naming the one save.
        let replaced = new_path.exists() && !is_same_file(&old_path, &new_path)?;
        if replaced {
            fs_err::remove_file(&new_path)?;
        }

        move_file(&old_path, &new_path)?;

        Ok(RenameOutcome::Moved { replaced })
    }
}

fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    Ok(fs_err::canonicalize(a)? == fs_err::canonicalize(b)?)
}

/// Renames a file, falling back to copy and delete when the rename would
/// cross filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs_err::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "'{}' and '{}' are on different devices, copying instead",
                from.display(),
                to.display()
            );
            fs_err::copy(from, to)?;
            fs_err::remove_file(from)
        }
        Err(err) => Err(err),
    }
}
