use anyhow::Result;
use clap::{Args, ValueEnum};
use folio_editor::{BoundaryPoint, Editor, MemorySelectionHost, Range};
use std::fs;
use std::path::PathBuf;

use super::print_diagnostics;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Position {
    Start,
    End,
}

#[derive(Args, Debug)]
pub struct PasteArgs {
    /// Document to paste into
    pub input: PathBuf,

    /// Markup to paste
    #[arg(required_unless_present = "fragment_file")]
    pub fragment: Option<String>,

    /// Read the markup to paste from a file
    #[arg(long, conflicts_with = "fragment")]
    pub fragment_file: Option<PathBuf>,

    /// Where the caret sits when pasting
    #[arg(long, value_enum, default_value = "end")]
    pub at: Position,
}

pub fn paste(args: PasteArgs, config: &Config) -> Result<()> {
    let source = fs::read_to_string(&args.input)?;
    let fragment = match (&args.fragment, &args.fragment_file) {
        (Some(fragment), _) => fragment.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err(anyhow::anyhow!("Nothing to paste")),
    };

    let mut editor = Editor::new(config.schema.clone(), Box::new(MemorySelectionHost::new()));
    editor.set_markup(&source)?;

    if args.at == Position::End {
        let caret = end_of_document(&editor);
        editor.set_selection(caret);
    }

    editor.insert_markup(&fragment)?;
    editor.remove_fillers();
    print_diagnostics(&args.input, &editor.take_diagnostics());
    println!("{}", editor.markup());

    Ok(())
}

/// Caret after the last text in the document, or inside the last block
fn end_of_document(editor: &Editor) -> Range {
    let tree = editor.tree();
    let root = editor.root();
    let last_text = tree
        .descendants(root)
        .into_iter()
        .filter(|&node| tree.is_text(node))
        .last();

    let point = match last_text {
        Some(text) => BoundaryPoint::new(text, tree.length(text)),
        None => {
            let block = tree.last_child(root).unwrap_or(root);
            BoundaryPoint::new(block, 0)
        }
    };
    Range::collapsed_at(point)
}
