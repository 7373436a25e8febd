//! An in-memory installer dialog.

use std::collections::BTreeMap;

use librecall::{ChoiceKind, ChoiceMarking, ChoiceView, GroupView, InstallerView, StepView};

#[derive(Debug, Default)]
pub struct FakeView {
    pub package_name: String,
    pub step: Option<StepView>,
    pub markings: BTreeMap<(usize, usize), ChoiceMarking>,
    pub install_confirmed: bool,
}

impl FakeView {
    pub fn new(package_name: &str, step: StepView) -> Self {
        Self {
            package_name: package_name.to_owned(),
            step: Some(step),
            ..Self::default()
        }
    }

    /// Selects one radio choice of a group, deselecting the others.
    pub fn select_radio(&mut self, group_index: usize, choice_index: usize) {
        let step = self.step.as_mut().expect("no visible step");
        for (index, choice) in step.groups[group_index].choices.iter_mut().enumerate() {
            choice.is_checked = index == choice_index;
        }
    }

    pub fn marking(&self, group_index: usize, choice_index: usize) -> Option<&ChoiceMarking> {
        self.markings.get(&(group_index, choice_index))
    }
}

impl InstallerView for FakeView {
    fn package_name(&self) -> String {
        self.package_name.clone()
    }

    fn current_step(&self) -> Option<StepView> {
        self.step.clone()
    }

    fn mark_choice(&mut self, group_index: usize, choice_index: usize, marking: ChoiceMarking) {
        self.markings.insert((group_index, choice_index), marking);
    }

    fn set_checked(&mut self, group_index: usize, choice_index: usize, checked: bool) {
        if let Some(step) = &mut self.step {
            step.groups[group_index].choices[choice_index].is_checked = checked;
        }
    }

    fn install_confirmed(&self) -> bool {
        self.install_confirmed
    }
}

pub fn radio(text: &str, ordinal: i64, is_checked: bool) -> ChoiceView {
    ChoiceView {
        text: text.to_owned(),
        ordinal,
        is_checked,
        is_enabled: true,
        kind: ChoiceKind::Radio,
    }
}

pub fn single_group_step(step_title: &str, group_title: &str, choices: Vec<ChoiceView>) -> StepView {
    StepView {
        title: step_title.to_owned(),
        ordinal: 0,
        groups: vec![GroupView {
            title: group_title.to_owned(),
            ordinal: 0,
            choices,
        }],
    }
}
