use clap::Parser;

use crate::migration::{self, RootStatus};

use super::GlobalOptions;

/// Move saves left by older versions into the current save folder.
///
/// Every legacy folder is backed up next to itself before it is touched.
#[derive(Debug, Parser)]
pub struct MigrateCommand {}

impl MigrateCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        let layout = global.layout.save_layout()?;
        let reports = migration::migrate(&layout);

        let mut failed = 0;

        for report in &reports {
            match report.status {
                RootStatus::Skipped => {
                    println!("{}: no saves in {}", report.generation, report.root.display());
                }
                RootStatus::Aborted => {
                    failed += 1;
                    println!(
                        "{}: could not back up {}, nothing migrated",
                        report.generation,
                        report.root.display()
                    );
                }
                RootStatus::Migrated => {
                    failed += report.failed;
                    println!(
                        "{}: {} moved, {} discarded as outdated, {} failed",
                        report.generation, report.moved, report.discarded, report.failed
                    );
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("Migration finished with {failed} failures, see the log for details");
        }

        println!("Saves are in {}", layout.saves_v3_folder().display());

        Ok(())
    }
}
