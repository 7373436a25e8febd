use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::{save::Save, store::SaveStore};

use super::GlobalOptions;

/// Print the choices saved for a package.
#[derive(Debug, Parser)]
pub struct ShowCommand {
    /// Name of the package, as shown in the installer.
    pub package: String,
}

impl ShowCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        let store = SaveStore::new(global.layout.save_layout()?);
        let path = store.save_path(&self.package);

        let save = store
            .load(&self.package)
            .with_context(|| format!("No readable save for '{}' at {}", self.package, path.display()))?;

        let mut stdout = StandardStream::stdout(global.color.into());
        print_save(&mut stdout, &save)?;
        stdout.flush()?;

        Ok(())
    }
}

fn print_save<W: WriteColor>(out: &mut W, save: &Save) -> io::Result<()> {
    let mut checked = ColorSpec::new();
    checked.set_fg(Some(Color::Green)).set_bold(true);

    for step in &save.steps {
        writeln!(out, "{} [{}]", step.title, step.ordinal)?;

        for group in &step.groups {
            writeln!(out, "  {} [{}]", group.title, group.ordinal)?;

            for choice in &group.choices {
                if choice.is_checked {
                    out.set_color(&checked)?;
                    write!(out, "    [x] {}", choice.text)?;
                    out.reset()?;
                } else {
                    write!(out, "    [ ] {}", choice.text)?;
                }
                writeln!(out, " [{}]", choice.ordinal)?;
            }
        }
    }

    Ok(())
}
