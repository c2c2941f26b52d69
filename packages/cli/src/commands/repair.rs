use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{Editor, MemorySelectionHost};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::print_diagnostics;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Input markup file
    pub input: PathBuf,

    /// Write the repaired markup here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the input file
    #[arg(long, conflicts_with = "output")]
    pub in_place: bool,
}

pub fn repair(args: RepairArgs, config: &Config) -> Result<()> {
    let source = fs::read_to_string(&args.input)?;

    let mut editor = Editor::new(config.schema.clone(), Box::new(MemorySelectionHost::new()));
    editor.set_markup(&source)?;
    let repaired = editor.markup();
    print_diagnostics(&args.input, &editor.take_diagnostics());

    let target = if args.in_place {
        Some(args.input.clone())
    } else {
        args.output
    };

    match target {
        Some(path) => {
            fs::write(&path, &repaired)?;
            info!(path = %path.display(), bytes = repaired.len(), "wrote repaired markup");
            eprintln!("{} {}", "✓".green(), path.display());
        }
        None => println!("{}", repaired),
    }

    Ok(())
}
