//! # Folio Editor
//!
//! Schema-constrained tree repair and range mutation for rich-text editing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ dom: arena tree + markup codec              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: schema + repair + range mutation    │
//! │  - Classify nodes against the schema        │
//! │  - Wrap, unwind and prune invalid content   │
//! │  - Split/merge, extract, delete, insert     │
//! │  - Bookmarked snapshots for undo/redo       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: selection, focus, scroll              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Schema violations are repaired, never reported**: the repair pass deletes,
//!    unwraps or wraps until the tree fits
//! 2. **Explicit context**: every call takes the [`EditorContext`] it works against
//! 3. **Primitives keep the range**: each mutation leaves the range at a defined place
//! 4. **One repair per command**: primitives never run the full pass themselves
//!
//! ## Usage
//!
//! ```rust
//! use folio_editor::{BoundaryPoint, Editor, MemorySelectionHost, Range, SchemaConfig};
//!
//! let mut editor = Editor::new(SchemaConfig::default(), Box::new(MemorySelectionHost::new()));
//! editor.set_markup("<p>Hello</p><p>World</p>").unwrap();
//!
//! // Select the line break between the two paragraphs and delete it
//! let texts: Vec<_> = editor
//!     .tree()
//!     .descendants(editor.root())
//!     .into_iter()
//!     .filter(|&node| editor.tree().is_text(node))
//!     .collect();
//! editor.set_selection(Range::new(
//!     BoundaryPoint::new(texts[0], 5),
//!     BoundaryPoint::new(texts[1], 0),
//! ));
//! editor.delete_selection().unwrap();
//!
//! assert_eq!(editor.markup(), "<p>HelloWorld<br></p>");
//! editor.undo().unwrap();
//! assert_eq!(editor.markup(), "<p>Hello<br></p><p>World<br></p>");
//! ```

pub mod bookmark;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod editor;
pub mod errors;
pub mod history;
pub mod host;
pub mod mutation;
pub mod range;
pub mod repair;
pub mod schema;
pub mod split_merge;
pub mod walker;

pub use config::{ClassAttribute, HostCapabilities, SchemaConfig, TagAttributes};
pub use context::EditorContext;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevel, Diagnostics};
pub use editor::Editor;
pub use errors::{EditorError, EditorResult};
pub use history::{History, Restored, Snapshot};
pub use host::{MemorySelectionHost, ScrollPosition, SelectionHost};
pub use range::{BoundaryPoint, Range};
pub use schema::{Classification, Schema};

// Re-export the tree types callers need alongside the editor
pub use folio_dom::{Element, NodeId, Tree};
