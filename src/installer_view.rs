//! The boundary between installer sessions and the installer UI.
//!
//! The UI side hands out plain snapshots of the visible wizard step and
//! accepts markings for individual choices. Nothing here knows about
//! widgets.

/// A wizard step as currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub title: String,
    pub ordinal: i64,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub title: String,
    pub ordinal: i64,
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub text: String,
    pub ordinal: i64,
    pub is_checked: bool,
    /// Disabled choices are fixed by the installer and cannot be toggled.
    pub is_enabled: bool,
    pub kind: ChoiceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    /// Exactly one choice in the group can be selected.
    Radio,
    Checkbox,
}

/// How a choice should be highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceMarking {
    /// No highlight. The UI restores the choice's own tooltip and style.
    Cleared,
    /// The choice was selected during the previous install.
    Previous { style: String },
    /// The choice's state differs from the previous install.
    Differs { style: String },
}

impl ChoiceMarking {
    /// Tooltip text to show in front of the choice's own tooltip.
    pub fn tooltip(&self) -> Option<&'static str> {
        match self {
            ChoiceMarking::Cleared => None,
            ChoiceMarking::Previous { .. } => {
                Some("You previously selected this choice when you installed this mod.")
            }
            ChoiceMarking::Differs { .. } => Some(
                "This choice doesn't match your previous choice when you installed this mod.",
            ),
        }
    }

    /// Opaque style string for the UI, if any.
    pub fn style(&self) -> Option<&str> {
        match self {
            ChoiceMarking::Cleared => None,
            ChoiceMarking::Previous { style } | ChoiceMarking::Differs { style } => Some(style),
        }
    }
}

/// A live installer dialog.
///
/// Group and choice indices passed to [`mark_choice`](Self::mark_choice) and
/// [`set_checked`](Self::set_checked) are positions in the vectors of the
/// [`StepView`] last returned by [`current_step`](Self::current_step), not
/// ordinals.
pub trait InstallerView {
    /// Name of the package being installed, as currently entered in the
    /// dialog.
    fn package_name(&self) -> String;

    /// The visible step, or `None` if the dialog has no recognizable step.
    fn current_step(&self) -> Option<StepView>;

    fn mark_choice(&mut self, group_index: usize, choice_index: usize, marking: ChoiceMarking);

    fn set_checked(&mut self, group_index: usize, choice_index: usize, checked: bool);

    /// Whether the install action is the one that closed the dialog.
    fn install_confirmed(&self) -> bool;
}
