use librecall::{
    ChoiceMarking, ChoiceSync, ChoiceRecord, GroupRecord, Save, SessionEvent, SessionState,
    Settings, StepRecord,
};
use pretty_assertions::assert_eq;

use crate::recall_test::{
    fake_view::{radio, single_group_step, FakeView},
    fixture::{fast_mode_save, Fixture},
};

#[test]
fn previous_choice_is_shown_and_new_choice_is_saved() {
    let fixture = Fixture::new();
    fixture.store().persist("Sky UI", &fast_mode_save()).unwrap();

    let mut sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());
    let settings = sync.settings().clone();

    let mut view = FakeView::new(
        "Sky UI",
        single_group_step(
            "Step 1",
            "Mode",
            vec![radio("Fast", 0, true), radio("Slow", 1, false)],
        ),
    );

    let session = sync.open_session().unwrap();
    session.handle(SessionEvent::StepShown, &mut view);

    assert_eq!(
        view.marking(0, 0),
        Some(&ChoiceMarking::Previous {
            style: settings.previous_choice_style_sheet.clone()
        })
    );
    assert_eq!(view.marking(0, 1), Some(&ChoiceMarking::Cleared));

    view.select_radio(0, 1);
    session.handle(SessionEvent::ChoiceToggled, &mut view);
    assert_eq!(
        view.marking(0, 0),
        Some(&ChoiceMarking::Previous {
            style: settings.previous_choice_style_sheet.clone()
        })
    );
    assert_eq!(
        view.marking(0, 1),
        Some(&ChoiceMarking::Differs {
            style: settings.hint_choice_style_sheet.clone()
        })
    );

    session.handle(SessionEvent::NavigatePressed, &mut view);
    view.install_confirmed = true;
    session.handle(SessionEvent::Closed, &mut view);
    assert_eq!(session.state(), SessionState::Persisted);

    let closed = sync.close_session().unwrap();
    assert_eq!(closed.previous_save(), Some(&fast_mode_save()));

    let persisted = fixture.store().load("Sky UI").unwrap();
    let mode = persisted
        .find_step("Step 1", 0)
        .and_then(|step| step.find_group("Mode", 0))
        .unwrap();

    assert!(!mode.find_choice("Fast", 0).unwrap().is_checked);
    assert!(mode.find_choice("Slow", 1).unwrap().is_checked);
}

#[test]
fn persisted_file_layout() {
    let fixture = Fixture::new();
    let mut sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());

    let mut view = FakeView::new(
        "Sky UI",
        single_group_step(
            "Step 1",
            "Mode",
            vec![radio("Fast", 0, false), radio("Slow", 1, true)],
        ),
    );
    view.install_confirmed = true;

    let session = sync.open_session().unwrap();
    session.handle(SessionEvent::StepShown, &mut view);
    session.handle(SessionEvent::NavigatePressed, &mut view);
    session.handle(SessionEvent::Closed, &mut view);

    let contents = fs_err::read_to_string(fixture.layout.save_path("Sky UI")).unwrap();
    insta::assert_snapshot!(contents, @r#"
    {
        "steps": [
            {
                "title": "Step 1",
                "widgetIndex": 0,
                "groups": [
                    {
                        "title": "Mode",
                        "widgetIndex": 0,
                        "choices": [
                            {
                                "text": "Fast",
                                "widgetIndex": 0,
                                "isChecked": false
                            },
                            {
                                "text": "Slow",
                                "widgetIndex": 1,
                                "isChecked": true
                            }
                        ]
                    }
                ]
            }
        ]
    }
    "#);
}

#[test]
fn legacy_save_without_ordinals_is_matched_and_upgraded() {
    let fixture = Fixture::new();
    fixture
        .store()
        .persist(
            "Sky UI",
            &Save {
                steps: vec![StepRecord::new("Step 1", -1).with_group(
                    GroupRecord::new("Mode", -1)
                        .with_choice(ChoiceRecord::new("Fast", -1, true))
                        .with_choice(ChoiceRecord::new("Slow", -1, false)),
                )],
            },
        )
        .unwrap();

    let mut sync = ChoiceSync::start(Settings::default(), fixture.layout.clone(), &fixture.mods_dir());
    let mut view = FakeView::new(
        "Sky UI",
        single_group_step(
            "Step 1",
            "Mode",
            vec![radio("Fast", 0, false), radio("Slow", 1, true)],
        ),
    );

    let session = sync.open_session().unwrap();
    session.handle(SessionEvent::StepShown, &mut view);
    assert!(matches!(
        view.marking(0, 0),
        Some(ChoiceMarking::Previous { .. })
    ));

    session.handle(SessionEvent::NavigatePressed, &mut view);
    view.install_confirmed = true;
    session.handle(SessionEvent::Closed, &mut view);

    assert_eq!(fixture.store().load("Sky UI"), Some(fast_mode_save_inverted()));
}

#[test]
fn disabled_tracking_opens_no_session() {
    let fixture = Fixture::new();
    let settings = Settings {
        enabled: false,
        ..Settings::default()
    };

    let mut sync = ChoiceSync::start(settings, fixture.layout.clone(), &fixture.mods_dir());

    assert!(sync.open_session().is_none());
    assert!(sync.session_mut().is_none());
}

fn fast_mode_save_inverted() -> Save {
    Save {
        steps: vec![StepRecord::new("Step 1", 0).with_group(
            GroupRecord::new("Mode", 0)
                .with_choice(ChoiceRecord::new("Fast", 0, false))
                .with_choice(ChoiceRecord::new("Slow", 1, true)),
        )],
    }
}
