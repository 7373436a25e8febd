use std::time::{Duration, Instant};

use librecall::{ChoiceSync, Settings};
use pretty_assertions::assert_eq;

use crate::recall_test::fixture::{fast_mode_save, Fixture};

#[test]
fn rename_moves_save_to_new_name() {
    let fixture = Fixture::new();
    let store = fixture.store();
    store.persist("Sky UI", &fast_mode_save()).unwrap();

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());
    sync.handle_rename("Sky UI", "SkyUI 5.2");

    assert!(!store.save_path("Sky UI").exists());
    assert_eq!(store.load("SkyUI 5.2"), Some(fast_mode_save()));
}

#[test]
fn rename_replaces_stale_save_under_new_name() {
    let fixture = Fixture::new();
    let store = fixture.store();
    store.persist("Sky UI", &fast_mode_save()).unwrap();
    store.persist("SkyUI 5.2", &librecall::Save::new()).unwrap();

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());
    sync.handle_rename("Sky UI", "SkyUI 5.2");

    assert_eq!(store.load("SkyUI 5.2"), Some(fast_mode_save()));
}

#[test]
fn rename_without_save_changes_nothing() {
    let fixture = Fixture::new();
    let store = fixture.store();
    store.persist("Unrelated", &fast_mode_save()).unwrap();

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());
    sync.handle_rename("Missing", "Unrelated");

    assert_eq!(store.load("Unrelated"), Some(fast_mode_save()));
    assert!(!store.save_path("Missing").exists());
}

#[test]
fn unwatchable_mods_dir_is_not_fatal() {
    let fixture = Fixture::new();
    let missing = fixture.root.join("no-such-mods");

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &missing);

    assert!(!sync.is_watching());
    fixture.store().persist("A", &fast_mode_save()).unwrap();
    sync.handle_rename("A", "B");
    assert!(fixture.store().save_path("B").exists());
}

#[test]
fn start_runs_migration() {
    let fixture = Fixture::new();
    let legacy = fixture.write_v2(
        "Sky UI",
        &crate::recall_test::fixture::legacy_save_json("Fast"),
        10,
    );

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());

    assert!(!legacy.exists());
    assert_eq!(sync.migration_reports()[1].moved, 1);
}

#[cfg(any(target_os = "linux", windows))]
#[test]
fn renamed_package_folder_carries_its_save() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let mods_dir = fixture.mods_dir();
    fs_err::create_dir(mods_dir.join("Sky UI")).unwrap();
    store.persist("Sky UI", &fast_mode_save()).unwrap();

    let sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &mods_dir);
    assert!(sync.is_watching());
    std::thread::sleep(Duration::from_millis(100));

    fs_err::rename(mods_dir.join("Sky UI"), mods_dir.join("SkyUI 5.2")).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !store.save_path("SkyUI 5.2").exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(store.load("SkyUI 5.2"), Some(fast_mode_save()));
    assert!(!store.save_path("Sky UI").exists());
}
