//! Non-fatal diagnostic channel
//!
//! Structural failures that the engine recovers from (a filler that cannot be placed,
//! a void element asked to take children) and caller-contract violations are recorded
//! here and mirrored to `tracing`. Nothing in this channel aborts a repair pass.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A structural operation failed and was skipped
    StructuralFailure,
    /// A caller handed the engine something it cannot work with
    ContractViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Parent markup, attempted child and similar details
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            kind: DiagnosticKind::StructuralFailure,
            message: message.into(),
            context: None,
        }
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            kind: DiagnosticKind::ContractViolation,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(
            kind = ?diagnostic.kind,
            context = diagnostic.context.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drain everything reported so far
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}
