pub mod check;
pub mod paste;
pub mod repair;

pub use check::{check, CheckArgs};
pub use paste::{paste, PasteArgs};
pub use repair::{repair, RepairArgs};

use colored::Colorize;
use folio_editor::{Diagnostic, DiagnosticLevel};
use std::path::Path;

/// Print diagnostics for one file to stderr
pub fn print_diagnostics(path: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
        };

        eprintln!("  {} {}: {}", level_str, path.display(), diagnostic.message);

        if let Some(context) = &diagnostic.context {
            eprintln!("    {}", context.dimmed());
        }
    }
}
