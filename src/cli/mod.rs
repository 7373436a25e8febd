//! Defines recall's CLI through clap types.

mod completions;
mod migrate;
mod show;
mod watch;

use std::{
    borrow::Cow,
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::Parser;
use thiserror::Error;

use crate::{layout::SaveLayout, settings::Settings};

pub use self::completions::CompletionsCommand;
pub use self::migrate::MigrateCommand;
pub use self::show::ShowCommand;
pub use self::watch::WatchCommand;

/// Command line options that recall accepts, defined using the clap crate.
#[derive(Debug, Parser)]
#[clap(name = "recall", version, about)]
pub struct Options {
    #[clap(flatten)]
    pub global: GlobalOptions,

    /// Subcommand to run in this invocation.
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

impl Options {
    pub fn run(self) -> anyhow::Result<()> {
        match self.subcommand {
            Subcommand::Migrate(subcommand) => subcommand.run(self.global),
            Subcommand::Watch(subcommand) => subcommand.run(self.global),
            Subcommand::Show(subcommand) => subcommand.run(self.global),
            Subcommand::Completions(subcommand) => subcommand.run(),
        }
    }
}

#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Sets verbosity level. Can be specified multiple times.
    #[clap(long("verbose"), short, global(true), action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Set color behavior. Valid values are auto, always, and never.
    #[clap(long("color"), global(true), default_value("auto"))]
    pub color: ColorChoice,

    /// Settings file to use. Defaults to `settings.toml` inside the data
    /// folder.
    #[clap(long, global(true))]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub layout: LayoutOptions,
}

impl GlobalOptions {
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let path = match &self.config {
            Some(path) => resolve_path(path).into_owned(),
            None => self.layout.save_layout()?.settings_path(),
        };

        Settings::load(&path)
    }
}

/// Where saves are kept.
#[derive(Debug, Parser)]
pub struct LayoutOptions {
    /// Folder the host keeps plugin data in. Defaults to the user's data
    /// folder.
    #[clap(long, global(true))]
    pub data_root: Option<PathBuf>,

    /// Folder the plugin is installed in, where older versions kept their
    /// saves. Defaults to the current directory.
    #[clap(long, global(true))]
    pub plugin_dir: Option<PathBuf>,

    /// Name of the managed game.
    #[clap(long, global(true))]
    pub game: Option<String>,

    /// Profile name used by the oldest save format.
    #[clap(long, global(true), default_value = "Default")]
    pub profile: String,
}

impl LayoutOptions {
    pub fn data_root(&self) -> PathBuf {
        match &self.data_root {
            Some(path) => resolve_path(path).into_owned(),
            None => dirs::data_dir()
                .map(|dir| dir.join("recall"))
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn save_layout(&self) -> anyhow::Result<SaveLayout> {
        let game = self
            .game
            .as_deref()
            .context("A game name is required, pass it with --game")?;

        let plugin_dir = match &self.plugin_dir {
            Some(path) => resolve_path(path).into_owned(),
            None => env::current_dir().context("Could not read the current directory")?,
        };

        Ok(SaveLayout::new(self.data_root(), plugin_dir, game).with_profile(self.profile.clone()))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = ColorChoiceParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        match source {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(ColorChoiceParseError {
                attempted: source.to_owned(),
            }),
        }
    }
}

impl From<ColorChoice> for termcolor::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => termcolor::ColorChoice::Auto,
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid color choice '{attempted}'. Valid values are: auto, always, never")]
pub struct ColorChoiceParseError {
    attempted: String,
}

#[derive(Debug, Parser)]
pub enum Subcommand {
    Migrate(MigrateCommand),
    Watch(WatchCommand),
    Show(ShowCommand),
    Completions(CompletionsCommand),
}

impl Subcommand {
    pub fn command_name(&self) -> &'static str {
        match self {
            Subcommand::Migrate(_) => "migrate",
            Subcommand::Watch(_) => "watch",
            Subcommand::Show(_) => "show",
            Subcommand::Completions(_) => "completions",
        }
    }

    /// Whether the command runs long enough to be worth a log file.
    pub fn wants_file_log(&self) -> bool {
        matches!(self, Subcommand::Migrate(_) | Subcommand::Watch(_))
    }
}

pub fn resolve_path(path: &Path) -> Cow<'_, Path> {
    if path.is_absolute() {
        Cow::Borrowed(path)
    } else {
        match env::current_dir() {
            Ok(current_dir) => Cow::Owned(current_dir.join(path)),
            Err(_) => Cow::Borrowed(path),
        }
    }
}
