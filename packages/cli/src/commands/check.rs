use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use folio_dom::{markup, Element, Tree};
use folio_editor::{Editor, MemorySelectionHost};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::print_diagnostics;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input markup file or directory to check
    pub input: PathBuf,

    /// Also list files that are already valid
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Outcome of checking one file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: String,
    needs_repair: bool,
    diagnostics: Vec<folio_editor::Diagnostic>,
}

pub fn check(args: CheckArgs, config: &Config) -> Result<()> {
    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        find_markup_files(&args.input, config)
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let mut reports = Vec::new();
    for file in &files {
        reports.push(check_file(file, config)?);
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            if report.needs_repair {
                println!("{} {}", "needs repair".yellow().bold(), report.path);
            } else if args.all {
                println!("{} {}", "✓".green(), report.path);
            }
            print_diagnostics(Path::new(&report.path), &report.diagnostics);
        }
    }

    let invalid = reports.iter().filter(|report| report.needs_repair).count();

    if args.format == OutputFormat::Text {
        println!();
        println!(
            "✨ {} Check complete!",
            if invalid > 0 {
                "Done".yellow().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Files checked: {}", reports.len());
        if invalid > 0 {
            println!("   {} {}", "Needs repair:".yellow(), invalid);
        } else {
            println!("   {} Every document fits the schema", "✓".green());
        }
    }

    // Exit with error code if anything needs repair
    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn check_file(path: &Path, config: &Config) -> Result<FileReport> {
    let source = fs::read_to_string(path)?;

    // Serialize the input as-is so formatting differences don't count
    let mut tree = Tree::new(Element::new("DIV"));
    let root = tree.root();
    markup::parse_into(&mut tree, root, &source)?;
    let original = markup::serialize_children(&tree, root);

    let mut editor = Editor::new(config.schema.clone(), Box::new(MemorySelectionHost::new()));
    editor.set_markup(&source)?;

    Ok(FileReport {
        path: path.display().to_string(),
        needs_repair: editor.markup() != original,
        diagnostics: editor.take_diagnostics(),
    })
}

fn find_markup_files(dir: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && config.matches(path))
        .collect()
}
