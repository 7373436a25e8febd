//! Remembers the choices made in installer wizards and shows them again the
//! next time the same package is installed.

pub mod choice_sync;
pub mod cli;
pub mod installer_view;
pub mod layout;
pub mod logging;
pub mod migration;
pub mod rename_processor;
pub mod save;
pub mod session;
pub mod settings;
pub mod store;

pub use choice_sync::ChoiceSync;
pub use installer_view::{
    ChoiceKind, ChoiceMarking, ChoiceView, GroupView, InstallerView, StepView,
};
pub use layout::{escape_file_name, SaveLayout};
pub use migration::{migrate, LegacyRoot, MigrationEngine, MigrationReport, RootStatus};
pub use save::{ChoiceRecord, GroupRecord, Save, StepRecord, UNKNOWN_ORDINAL};
pub use session::{InstallerSession, SessionEvent, SessionState};
pub use settings::Settings;
pub use store::{RenameOutcome, SaveStore};
