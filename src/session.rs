//! One installer dialog's lifetime, from the first step shown until the
//! dialog closes.
//!
//! The session reads the package's save once, highlights previously chosen
//! options on every step shown, and collects the state of every step the
//! user leaves into a working copy. The working copy is written back only
//! when the dialog closes with the install confirmed.

use std::sync::Arc;

use crate::{
    installer_view::{ChoiceKind, ChoiceMarking, ChoiceView, InstallerView, StepView},
    save::{ChoiceRecord, GroupRecord, Save, StepRecord},
    settings::Settings,
    store::SaveStore,
};

/// Something that happened in the installer dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A step became visible, either when the dialog opened or after
    /// navigating.
    StepShown,
    /// A navigation button was pressed. Must be delivered while the step
    /// being left is still the visible one.
    NavigatePressed,
    /// The user toggled a choice on the visible step.
    ChoiceToggled,
    /// The package name entered in the dialog changed.
    PackageRenamed(String),
    /// The dialog closed.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    SaveLoaded,
    StepCaptured,
    Persisted,
    Discarded,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Persisted | SessionState::Discarded)
    }
}

pub struct InstallerSession {
    store: SaveStore,
    settings: Arc<Settings>,
    state: SessionState,
    package_name: Option<String>,
    save_loaded: bool,

    /// The save as it was on disk when the session started. Never modified.
    previous: Option<Save>,

    /// Where captured steps accumulate.
    working: Save,
}

impl InstallerSession {
    pub fn new(store: SaveStore, settings: Arc<Settings>) -> Self {
        Self {
            store,
            settings,
            state: SessionState::New,
            package_name: None,
            save_loaded: false,
            previous: None,
            working: Save::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn previous_save(&self) -> Option<&Save> {
        self.previous.as_ref()
    }

    pub fn working_save(&self) -> &Save {
        &self.working
    }

    pub fn handle<V>(&mut self, event: SessionEvent, view: &mut V)
    where
        V: InstallerView + ?Sized,
    {
        if self.state.is_terminal() {
            log::trace!("Ignoring {:?}, session already ended", event);
            return;
        }

        match event {
            SessionEvent::StepShown => {
                self.load_save(view);
                self.apply_previous_choices(view, self.settings.auto_select_previous_choices);
            }
            SessionEvent::NavigatePressed => self.capture_current_step(view),
            SessionEvent::ChoiceToggled => self.apply_previous_choices(view, false),
            SessionEvent::PackageRenamed(name) => {
                log::debug!("Package name changed: '{}'", name);
                self.package_name = Some(name);
            }
            SessionEvent::Closed => self.close(view),
        }
    }

    fn load_save<V>(&mut self, view: &V)
    where
        V: InstallerView + ?Sized,
    {
        if self.save_loaded {
            return;
        }
        self.save_loaded = true;

        let package_name = self
            .package_name
            .get_or_insert_with(|| view.package_name())
            .clone();

        self.previous = self.store.load(&package_name);
        if let Some(previous) = &self.previous {
            self.working = previous.clone();
        }

        if self.state == SessionState::New {
            self.state = SessionState::SaveLoaded;
        }
    }

    /// Highlights every choice on the visible step against the previous
    /// save, optionally restoring the previous state of enabled choices.
    fn apply_previous_choices<V>(&self, view: &mut V, auto_select: bool)
    where
        V: InstallerView + ?Sized,
    {
        let Some(previous) = &self.previous else {
            return;
        };

        let Some(step) = view.current_step() else {
            log::debug!("No visible step to apply previous choices to");
            return;
        };

        let Some(saved_step) = previous.find_step(&step.title, step.ordinal) else {
            return;
        };

        for (group_index, group) in step.groups.iter().enumerate() {
            let saved_group = saved_step.find_group(&group.title, group.ordinal);

            for (choice_index, choice) in group.choices.iter().enumerate() {
                let saved_choice =
                    saved_group.and_then(|saved| saved.find_choice(&choice.text, choice.ordinal));

                let mut is_checked = choice.is_checked;

                if let Some(saved_choice) = saved_choice {
                    if auto_select && choice.is_enabled && saved_choice.is_checked != is_checked {
                        view.set_checked(group_index, choice_index, saved_choice.is_checked);
                        is_checked = saved_choice.is_checked;
                    }
                }

                let marking = self.marking_for(choice, is_checked, saved_choice);
                view.mark_choice(group_index, choice_index, marking);
            }
        }
    }

    fn marking_for(
        &self,
        choice: &ChoiceView,
        is_checked: bool,
        saved: Option<&ChoiceRecord>,
    ) -> ChoiceMarking {
        let Some(saved) = saved else {
            return ChoiceMarking::Cleared;
        };

        // A radio button that was chosen before always reads as the previous
        // choice; the other buttons of its group carry the hint.
        if saved.is_checked && choice.kind == ChoiceKind::Radio {
            ChoiceMarking::Previous {
                style: self.settings.previous_choice_style(choice.is_enabled).to_owned(),
            }
        } else if saved.is_checked != is_checked {
            ChoiceMarking::Differs {
                style: self.settings.hint_choice_style(choice.is_enabled).to_owned(),
            }
        } else if saved.is_checked {
            ChoiceMarking::Previous {
                style: self.settings.previous_choice_style(choice.is_enabled).to_owned(),
            }
        } else {
            ChoiceMarking::Cleared
        }
    }

    fn capture_current_step<V>(&mut self, view: &V)
    where
        V: InstallerView + ?Sized,
    {
        // The working copy must start from the save even if no step was
        // reported shown yet.
        self.load_save(view);

        let Some(step) = view.current_step() else {
            log::debug!("No visible step to capture");
            return;
        };

        if self.settings.debug_dump_step {
            dump_step(&step);
        }

        self.working.upsert_step(capture_step(&step));
        self.state = SessionState::StepCaptured;
    }

    fn close<V>(&mut self, view: &V)
    where
        V: InstallerView + ?Sized,
    {
        self.load_save(view);

        if !view.install_confirmed() {
            log::debug!("Not saving, the install was not confirmed");
            self.state = SessionState::Discarded;
            return;
        }

        if self.working.is_empty() {
            log::debug!("Not saving, no steps were captured");
            self.state = SessionState::Discarded;
            return;
        }

        let package_name = self
            .package_name
            .get_or_insert_with(|| view.package_name())
            .clone();

        match self.store.persist(&package_name, &self.working) {
            Ok(path) => log::info!(
                "Saved choices for '{}' into '{}'",
                package_name,
                path.display()
            ),
            Err(err) => log::error!("Failed to save choices for '{}': {}", package_name, err),
        }

        self.state = SessionState::Persisted;
    }
}

/// Converts the visible step into the record that gets saved.
pub fn capture_step(step: &StepView) -> StepRecord {
    StepRecord {
        title: step.title.clone(),
        ordinal: step.ordinal,
        groups: step
            .groups
            .iter()
            .map(|group| GroupRecord {
                title: group.title.clone(),
                ordinal: group.ordinal,
                choices: group
                    .choices
                    .iter()
                    .map(|choice| {
                        ChoiceRecord::new(choice.text.clone(), choice.ordinal, choice.is_checked)
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn dump_step(step: &StepView) {
    log::info!("Step '{}', ordinal {}", step.title, step.ordinal);
    for group in &step.groups {
        log::info!("  Group '{}', ordinal {}", group.title, group.ordinal);
        for choice in &group.choices {
            log::info!(
                "    Choice '{}', ordinal {}, checked: {}, enabled: {}, {:?}",
                choice.text,
                choice.ordinal,
                choice.is_checked,
                choice.is_enabled,
                choice.kind
            );
        }
    }
}
