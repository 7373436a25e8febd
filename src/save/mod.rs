//! The saved-choices tree: a [`Save`] holds steps, steps hold groups, groups
//! hold choices.
//!
//! Every level is identified by its title plus its ordinal, the position it
//! had among its siblings when it was captured. Ordinals only break ties
//! between same-titled siblings. Saves written before ordinals were recorded
//! load with [`UNKNOWN_ORDINAL`].
//!
//! On disk a save is a JSON object:
//!
//! ```json
//! { "steps": [ { "title": "...", "widgetIndex": 0, "groups": [
//!     { "title": "...", "widgetIndex": 0, "choices": [
//!         { "text": "...", "widgetIndex": 0, "isChecked": true } ] } ] } ] }
//! ```

mod matching;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use matching::{find_saved, lookup_saved, Lookup, SavedNode};

/// Ordinal of records saved before ordinals were recorded.
pub const UNKNOWN_ORDINAL: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub title: String,

    #[serde(
        rename = "widgetIndex",
        default = "unknown_ordinal",
        deserialize_with = "ordinal_or_unknown"
    )]
    pub ordinal: i64,

    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub title: String,

    #[serde(
        rename = "widgetIndex",
        default = "unknown_ordinal",
        deserialize_with = "ordinal_or_unknown"
    )]
    pub ordinal: i64,

    pub choices: Vec<ChoiceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub text: String,

    #[serde(
        rename = "widgetIndex",
        default = "unknown_ordinal",
        deserialize_with = "ordinal_or_unknown"
    )]
    pub ordinal: i64,

    #[serde(rename = "isChecked")]
    pub is_checked: bool,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Save data is malformed: {source}")]
    Malformed { source: serde_json::Error },

    #[error("Could not encode save data: {source}")]
    Encode { source: serde_json::Error },
}

impl Save {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a save. Any structural problem anywhere in the tree rejects
    /// the whole save; nothing is partially loaded.
    pub fn from_slice(contents: &[u8]) -> Result<Self, SaveError> {
        serde_json::from_slice(contents).map_err(|source| SaveError::Malformed { source })
    }

    pub fn from_json(contents: &str) -> Result<Self, SaveError> {
        Self::from_slice(contents.as_bytes())
    }

    /// Encodes the save as JSON indented with four spaces.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, SaveError> {
        let mut output = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut output, formatter);

        self.serialize(&mut serializer)
            .map_err(|source| SaveError::Encode { source })?;

        Ok(output)
    }

    pub fn find_step(&self, title: &str, ordinal: i64) -> Option<&StepRecord> {
        find_saved(&self.steps, title, ordinal)
    }

    /// Inserts a step, or replaces the first stored step with the same title
    /// whose ordinal either matches or is unknown.
    ///
    /// Accepting an unknown stored ordinal lets a save from before ordinals
    /// existed be updated in place instead of growing a duplicate.
    pub fn upsert_step(&mut self, step: StepRecord) {
        let existing = self.steps.iter_mut().find(|existing| {
            existing.title == step.title
                && (existing.ordinal == step.ordinal || existing.ordinal == UNKNOWN_ORDINAL)
        });

        match existing {
            Some(existing) => *existing = step,
            None => self.steps.push(step),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl StepRecord {
    pub fn new<S: Into<String>>(title: S, ordinal: i64) -> Self {
        Self {
            title: title.into(),
            ordinal,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: GroupRecord) -> Self {
        self.groups.push(group);
        self
    }

    pub fn find_group(&self, title: &str, ordinal: i64) -> Option<&GroupRecord> {
        find_saved(&self.groups, title, ordinal)
    }
}

impl GroupRecord {
    pub fn new<S: Into<String>>(title: S, ordinal: i64) -> Self {
        Self {
            title: title.into(),
            ordinal,
            choices: Vec::new(),
        }
    }

    pub fn with_choice(mut self, choice: ChoiceRecord) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn find_choice(&self, text: &str, ordinal: i64) -> Option<&ChoiceRecord> {
        find_saved(&self.choices, text, ordinal)
    }
}

impl ChoiceRecord {
    pub fn new<S: Into<String>>(text: S, ordinal: i64, is_checked: bool) -> Self {
        Self {
            text: text.into(),
            ordinal,
            is_checked,
        }
    }
}

impl SavedNode for StepRecord {
    const KIND: &'static str = "step";

    fn title(&self) -> &str {
        &self.title
    }

    fn ordinal(&self) -> i64 {
        self.ordinal
    }
}

impl SavedNode for GroupRecord {
    const KIND: &'static str = "group";

    fn title(&self) -> &str {
        &self.title
    }

    fn ordinal(&self) -> i64 {
        self.ordinal
    }
}

impl SavedNode for ChoiceRecord {
    const KIND: &'static str = "choice";

    fn title(&self) -> &str {
        &self.text
    }

    fn ordinal(&self) -> i64 {
        self.ordinal
    }
}

fn unknown_ordinal() -> i64 {
    UNKNOWN_ORDINAL
}

/// Older saves may carry `null` where an ordinal belongs.
fn ordinal_or_unknown<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(UNKNOWN_ORDINAL))
}
