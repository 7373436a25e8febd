use std::{path::PathBuf, thread, time::Duration};

use clap::Parser;

use crate::choice_sync::ChoiceSync;

use super::{resolve_path, GlobalOptions};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Migrate old saves, then keep saves following renamed package folders
/// until interrupted.
#[derive(Debug, Parser)]
pub struct WatchCommand {
    /// Folder containing one folder per installed package.
    pub mods_dir: PathBuf,
}

impl WatchCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        let settings = global.settings()?;
        let layout = global.layout.save_layout()?;
        let mods_dir = resolve_path(&self.mods_dir);

        let sync = ChoiceSync::start(settings, layout, &mods_dir);

        if !sync.is_watching() {
            anyhow::bail!("Could not watch {}", mods_dir.display());
        }

        log::info!("Following renames in {}, press Ctrl+C to stop", mods_dir.display());

        while sync.is_watching() {
            thread::sleep(POLL_INTERVAL);
        }

        anyhow::bail!("Stopped watching {} after repeated failures", mods_dir.display())
    }
}
