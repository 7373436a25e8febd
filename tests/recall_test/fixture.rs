//! Scratch save folders with controllable modification times.

use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use filetime::FileTime;
use librecall::{ChoiceRecord, GroupRecord, Save, SaveLayout, SaveStore, StepRecord};
use tempfile::TempDir;

pub const GAME: &str = "Skyrim Special Edition";

pub struct Fixture {
    // Held so the folder outlives the test.
    _dir: TempDir,
    pub root: PathBuf,
    pub layout: SaveLayout,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        let layout = SaveLayout::new(root.join("data"), root.join("plugin"), GAME)
            .with_profile("Default");

        Self {
            _dir: dir,
            root,
            layout,
        }
    }

    pub fn store(&self) -> SaveStore {
        SaveStore::new(self.layout.clone())
    }

    pub fn mods_dir(&self) -> PathBuf {
        let mods_dir = self.root.join("mods");
        fs_err::create_dir_all(&mods_dir).unwrap();
        mods_dir
    }

    pub fn write_v1(&self, package: &str, contents: &str, age: u64) -> PathBuf {
        write_aged(&self.layout.save_path_v1(package), contents, age)
    }

    pub fn write_v2(&self, package: &str, contents: &str, age: u64) -> PathBuf {
        write_aged(&self.layout.save_path_v2(package), contents, age)
    }

    pub fn write_current(&self, package: &str, contents: &str, age: u64) -> PathBuf {
        write_aged(&self.layout.save_path(package), contents, age)
    }
}

/// Writes a file and backdates it by `age` seconds, so tests can order files
/// by modification time without sleeping.
pub fn write_aged(path: &Path, contents: &str, age: u64) -> PathBuf {
    fs_err::create_dir_all(path.parent().unwrap()).unwrap();
    fs_err::write(path, contents).unwrap();

    let mtime = SystemTime::now() - Duration::from_secs(1000 + age);
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();

    path.to_path_buf()
}

pub fn read(path: &Path) -> String {
    fs_err::read_to_string(path).unwrap()
}

/// A save in the oldest format, which had no ordinals.
pub fn legacy_save_json(choice: &str) -> String {
    format!(
        r#"{{ "steps": [ {{ "title": "Options", "groups": [ {{ "title": "Mode", "choices": [ {{ "text": "{choice}", "isChecked": true }} ] }} ] }} ] }}"#
    )
}

/// Step 1 > Mode > Fast (checked), Slow (unchecked), everything at ordinal 0
/// and 1.
pub fn fast_mode_save() -> Save {
    Save {
        steps: vec![StepRecord::new("Step 1", 0).with_group(
            GroupRecord::new("Mode", 0)
                .with_choice(ChoiceRecord::new("Fast", 0, true))
                .with_choice(ChoiceRecord::new("Slow", 1, false)),
        )],
    }
}
