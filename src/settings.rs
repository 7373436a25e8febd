use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// User-facing settings. Every field has a default, so a partial or missing
/// settings file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Master switch. When off, installer sessions are not tracked at all.
    pub enabled: bool,

    /// Select previously chosen options automatically when a step is shown.
    pub auto_select_previous_choices: bool,

    /// Style applied to a previously selected choice the user can click.
    /// Passed to the UI verbatim.
    pub previous_choice_style_sheet: String,

    /// Style applied to a previously selected choice that is disabled.
    pub previous_choice_disabled_style_sheet: String,

    /// Style applied to a choice whose state differs from the previous
    /// install.
    pub hint_choice_style_sheet: String,

    pub hint_choice_disabled_style_sheet: String,

    /// Log every captured step.
    pub debug_dump_step: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_select_previous_choices: false,
            previous_choice_style_sheet: "background-color: rgba(0, 255, 0, 0.25)".to_owned(),
            previous_choice_disabled_style_sheet: "background-color: rgba(0, 255, 0, 0.15)"
                .to_owned(),
            hint_choice_style_sheet: "background-color: rgba(255, 255, 0, 0.25)".to_owned(),
            hint_choice_disabled_style_sheet: "background-color: rgba(255, 255, 0, 0.15)"
                .to_owned(),
            debug_dump_step: false,
        }
    }
}

impl Settings {
    /// Reads settings from a TOML file. A missing file gives the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No settings at '{}', using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs_err::read_to_string(path)?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid settings file at '{}'", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Style for a "previously selected" marking.
    pub fn previous_choice_style(&self, enabled: bool) -> &str {
        if enabled {
            &self.previous_choice_style_sheet
        } else {
            &self.previous_choice_disabled_style_sheet
        }
    }

    /// Style for a "differs from previous" marking.
    pub fn hint_choice_style(&self, enabled: bool) -> &str {
        if enabled {
            &self.hint_choice_style_sheet
        } else {
            &self.hint_choice_disabled_style_sheet
        }
    }
}
