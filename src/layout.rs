//! Where saves live on disk, for each generation of the save format.
//!
//! | generation | save path                                                     |
//! |------------|---------------------------------------------------------------|
//! | V1         | `<plugin_dir>/saves/<game>/<profile>/<package>.json`          |
//! | V2         | `<plugin_dir>/saves_v2/<game>/<package>.json`                 |
//! | V3         | `<data_root>/remember_installation_choices/saves_v3/<game>/<package>.json` |
//!
//! V3 is the current generation. Every path segment derived from a name goes
//! through [`escape_file_name`].

use std::path::{Path, PathBuf};

use crate::migration::LegacyRoot;

/// Folder under the host's plugin data root that holds everything we write.
pub const NAMESPACE: &str = "remember_installation_choices";

pub const SAVE_EXTENSION: &str = "json";

const DEFAULT_PROFILE: &str = "Default";

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// Works per character, so a multi-byte character becomes a single `_`.
/// Escaping an already escaped name is a no-op.
pub fn escape_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Save locations for one game (and, for the oldest generation, one
/// profile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLayout {
    data_root: PathBuf,
    plugin_dir: PathBuf,
    game_name: String,
    profile_name: String,
}

impl SaveLayout {
    /// `data_root` is the host's plugin data folder, `plugin_dir` the folder
    /// the plugin itself is installed in (where the legacy generations
    /// stored their saves).
    pub fn new<D, P, G>(data_root: D, plugin_dir: P, game_name: G) -> Self
    where
        D: Into<PathBuf>,
        P: Into<PathBuf>,
        G: Into<String>,
    {
        Self {
            data_root: data_root.into(),
            plugin_dir: plugin_dir.into(),
            game_name: game_name.into(),
            profile_name: DEFAULT_PROFILE.to_owned(),
        }
    }

    pub fn with_profile<S: Into<String>>(mut self, profile_name: S) -> Self {
        self.profile_name = profile_name.into();
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn namespace_dir(&self) -> PathBuf {
        self.data_root.join(NAMESPACE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.namespace_dir().join("logs")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.namespace_dir().join("settings.toml")
    }

    pub fn saves_v3_folder(&self) -> PathBuf {
        self.namespace_dir()
            .join("saves_v3")
            .join(escape_file_name(&self.game_name))
    }

    pub fn saves_v2_folder(&self) -> PathBuf {
        self.plugin_dir
            .join("saves_v2")
            .join(escape_file_name(&self.game_name))
    }

    pub fn saves_v1_folder(&self) -> PathBuf {
        self.plugin_dir
            .join("saves")
            .join(escape_file_name(&self.game_name))
    }

    /// Current-generation save path for a package.
    pub fn save_path(&self, package_name: &str) -> PathBuf {
        self.saves_v3_folder().join(save_file_name(package_name))
    }

    pub fn save_path_v2(&self, package_name: &str) -> PathBuf {
        self.saves_v2_folder().join(save_file_name(package_name))
    }

    pub fn save_path_v1(&self, package_name: &str) -> PathBuf {
        self.saves_v1_folder()
            .join(escape_file_name(&self.profile_name))
            .join(save_file_name(package_name))
    }

    /// Legacy save folders, oldest first. This is the order migration must
    /// visit them in.
    pub fn legacy_roots(&self) -> Vec<LegacyRoot> {
        vec![
            LegacyRoot::new(self.saves_v1_folder(), "V1"),
            LegacyRoot::new(self.saves_v2_folder(), "V2"),
        ]
    }
}

fn save_file_name(package_name: &str) -> String {
    format!("{}.{}", escape_file_name(package_name), SAVE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SaveLayout {
        SaveLayout::new("/data", "/plugins/recall", "Skyrim Special Edition").with_profile("My Profile")
    }

    #[test]
    fn escape_keeps_safe_characters() {
        assert_eq!(escape_file_name("Mod_Name-1.2"), "Mod_Name-1.2");
    }

    #[test]
    fn escape_replaces_everything_else() {
        assert_eq!(escape_file_name("Sky UI (SE)"), "Sky_UI__SE_");
        assert_eq!(escape_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(escape_file_name("Überarbeitung"), "_berarbeitung");
        assert_eq!(escape_file_name("🎮"), "_");
    }

    #[test]
    fn escape_is_idempotent() {
        let once = escape_file_name("Immersive Armors [v8]");
        assert_eq!(escape_file_name(&once), once);
    }

    #[test]
    fn current_generation_path() {
        assert_eq!(
            layout().save_path("Sky UI"),
            Path::new("/data")
                .join(NAMESPACE)
                .join("saves_v3")
                .join("Skyrim_Special_Edition")
                .join("Sky_UI.json")
        );
    }

    #[test]
    fn legacy_paths() {
        assert_eq!(
            layout().save_path_v2("Sky UI"),
            Path::new("/plugins/recall/saves_v2/Skyrim_Special_Edition/Sky_UI.json")
        );
        assert_eq!(
            layout().save_path_v1("Sky UI"),
            Path::new("/plugins/recall/saves/Skyrim_Special_Edition/My_Profile/Sky_UI.json")
        );
    }

    #[test]
    fn legacy_roots_are_oldest_first() {
        let roots = layout().legacy_roots();
        let generations: Vec<_> = roots.iter().map(|root| root.generation).collect();

        assert_eq!(generations, vec!["V1", "V2"]);
        assert_eq!(roots[0].path, layout().saves_v1_folder());
        assert_eq!(roots[1].path, layout().saves_v2_folder());
    }
}
