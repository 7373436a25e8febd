use librecall::{migrate, RootStatus, Save};
use pretty_assertions::assert_eq;

use crate::recall_test::fixture::{legacy_save_json, read, Fixture};

#[test]
fn legacy_save_moves_when_no_current_save() {
    let fixture = Fixture::new();
    let legacy = fixture.write_v2("Sky UI", &legacy_save_json("Fast"), 10);

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[1].status, RootStatus::Migrated);
    assert_eq!(reports[1].moved, 1);
    assert!(!legacy.exists());

    let current = fixture.store().load("Sky UI").unwrap();
    assert_eq!(current.steps[0].groups[0].choices[0].text, "Fast");
}

#[test]
fn newer_legacy_save_overwrites_older_current_save() {
    let fixture = Fixture::new();
    let current = fixture.write_current("Sky UI", &legacy_save_json("Old"), 100);
    let legacy = fixture.write_v2("Sky UI", &legacy_save_json("New"), 10);

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[1].moved, 1);
    assert_eq!(reports[1].discarded, 0);
    assert!(!legacy.exists());
    assert_eq!(read(&current), legacy_save_json("New"));
}

#[test]
fn older_legacy_save_is_discarded() {
    let fixture = Fixture::new();
    let current = fixture.write_current("Sky UI", &legacy_save_json("Current"), 10);
    let legacy = fixture.write_v2("Sky UI", &legacy_save_json("Legacy"), 100);

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[1].moved, 0);
    assert_eq!(reports[1].discarded, 1);
    assert!(!legacy.exists());
    assert_eq!(read(&current), legacy_save_json("Current"));
}

#[test]
fn equally_old_legacy_save_is_discarded() {
    let fixture = Fixture::new();
    let current = fixture.write_current("Sky UI", &legacy_save_json("Current"), 50);
    let legacy = fixture.write_v2("Sky UI", &legacy_save_json("Legacy"), 50);

    migrate(&fixture.layout);

    assert!(!legacy.exists());
    assert_eq!(read(&current), legacy_save_json("Current"));
}

#[test]
fn newest_generation_wins_across_roots() {
    let fixture = Fixture::new();
    let v1 = fixture.write_v1("Sky UI", &legacy_save_json("From V1"), 10);
    let v2 = fixture.write_v2("Sky UI", &legacy_save_json("From V2"), 200);

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[0].generation, "V1");
    assert_eq!(reports[0].moved, 1);
    assert_eq!(reports[1].generation, "V2");
    assert_eq!(reports[1].discarded, 1);

    assert!(!v1.exists());
    assert!(!v2.exists());
    assert_eq!(
        read(&fixture.layout.save_path("Sky UI")),
        legacy_save_json("From V1")
    );
}

#[test]
fn v1_saves_from_every_profile_are_migrated() {
    let fixture = Fixture::new();
    let default_profile = fixture.write_v1("Alpha", &legacy_save_json("A"), 10);
    let other_profile = fixture.layout.clone().with_profile("Other");
    let other = crate::recall_test::fixture::write_aged(
        &other_profile.save_path_v1("Beta"),
        &legacy_save_json("B"),
        10,
    );

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[0].moved, 2);
    assert!(!default_profile.exists());
    assert!(!other.exists());
    assert!(fixture.layout.save_path("Alpha").exists());
    assert!(fixture.layout.save_path("Beta").exists());
}

#[test]
fn legacy_root_is_backed_up_first() {
    let fixture = Fixture::new();
    fixture.write_v2("Sky UI", &legacy_save_json("Fast"), 10);
    fixture.write_current("Sky UI", &legacy_save_json("Newer"), 0);

    migrate(&fixture.layout);

    let backup = fixture
        .layout
        .saves_v2_folder()
        .with_file_name("Skyrim_Special_Edition_backup")
        .join("Sky_UI.json");
    assert_eq!(read(&backup), legacy_save_json("Fast"));
}

#[test]
fn failed_backup_leaves_root_untouched() {
    let fixture = Fixture::new();
    let v1 = fixture.write_v1("Alpha", &legacy_save_json("A"), 10);
    let v2 = fixture.write_v2("Beta", &legacy_save_json("B"), 10);

    // A file where the V1 backup folder should go makes the backup fail.
    let blocked = fixture
        .layout
        .saves_v1_folder()
        .with_file_name("Skyrim_Special_Edition_backup");
    fs_err::write(&blocked, "in the way").unwrap();

    let reports = migrate(&fixture.layout);

    assert_eq!(reports[0].status, RootStatus::Aborted);
    assert!(v1.exists());
    assert_eq!(reports[1].status, RootStatus::Migrated);
    assert!(!v2.exists());
    assert!(fixture.layout.save_path("Beta").exists());
}

#[test]
fn second_run_is_a_no_op() {
    let fixture = Fixture::new();
    fixture.write_v2("Sky UI", &legacy_save_json("Fast"), 10);

    migrate(&fixture.layout);
    let reports = migrate(&fixture.layout);

    assert!(reports
        .iter()
        .all(|report| report.status == RootStatus::Skipped));
}

#[test]
fn migrated_legacy_save_gains_unknown_ordinals() {
    let fixture = Fixture::new();
    fixture.write_v1("Sky UI", &legacy_save_json("Fast"), 10);

    migrate(&fixture.layout);

    let save: Save = fixture.store().load("Sky UI").unwrap();
    assert_eq!(save.steps[0].ordinal, librecall::UNKNOWN_ORDINAL);
}
