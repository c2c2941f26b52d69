//! # Editor
//!
//! One editing session: the document tree, its schema context, the undo history and
//! the host that owns the selection.
//!
//! ## Design
//!
//! - Every command reads the selection from the [`SelectionHost`], normalizes its
//!   order and checks that both boundaries are attached to the root
//! - Destructive commands checkpoint the history first and report the change after
//! - The full repair pass runs once per command, after the mutation primitives
//!
//! ## Example
//!
//! ```rust
//! use folio_editor::{Editor, MemorySelectionHost, SchemaConfig};
//!
//! let mut editor = Editor::new(SchemaConfig::default(), Box::new(MemorySelectionHost::new()));
//! editor.set_markup("<div>x<span>y</span></div>").unwrap();
//! assert_eq!(editor.markup(), "<p>x<span>y</span><br></p>");
//! ```

use tracing::{debug, info};

use folio_dom::{markup, Element, NodeId, Tree};

use crate::bookmark;
use crate::config::SchemaConfig;
use crate::context::EditorContext;
use crate::diagnostics::Diagnostic;
use crate::errors::{EditorError, EditorResult};
use crate::history::{replace_contents, History};
use crate::host::{ScrollPosition, SelectionHost};
use crate::mutation::{check_range, delete_contents, insert_fragment, insert_node_in_range};
use crate::range::{move_boundaries_down, start_block, BoundaryPoint, Range};
use crate::repair::{
    ensure_bottom_line, ensure_focusable, remove_empty_inlines, remove_fillers, repair_container,
    ZWS,
};
use crate::schema::is_leaf;
use crate::split_merge::split;
use crate::walker::next_block;

pub struct Editor {
    tree: Tree,
    ctx: EditorContext,
    history: History,
    host: Box<dyn SelectionHost>,
}

impl Editor {
    /// Create an editor with an empty, focusable document
    pub fn new(config: SchemaConfig, host: Box<dyn SelectionHost>) -> Self {
        let mut tree = Tree::new(Element::new("DIV"));
        let root = tree.root();
        let mut ctx = EditorContext::new(config, root);
        ensure_focusable(&mut tree, &mut ctx, root);

        let mut editor = Self {
            tree,
            ctx,
            history: History::new(),
            host,
        };
        let range = editor.start_of_document();
        editor.set_selection(range);
        editor
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Direct tree access for native edits. Call [`Editor::mark_changed`] afterwards.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.ctx.root
    }

    pub fn context(&self) -> &EditorContext {
        &self.ctx
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn host(&self) -> &dyn SelectionHost {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn SelectionHost {
        self.host.as_mut()
    }

    /// Drain the non-fatal diagnostics collected so far
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.ctx.diagnostics.take()
    }

    // --- Selection ---

    /// Current selection in document order, checked against the tree
    pub fn selection(&mut self) -> EditorResult<Range> {
        let range = self
            .host
            .boundary_pair()
            .ok_or(EditorError::NoSelection)?
            .normalized(&self.tree);
        check_range(&self.tree, &mut self.ctx, &range)?;
        Ok(range)
    }

    pub fn set_selection(&mut self, range: Range) {
        self.host.set_boundary_pair(range);
    }

    fn start_of_document(&self) -> Range {
        let root = self.ctx.root;
        let first = self.tree.first_child(root).unwrap_or(root);
        let mut range = Range::collapsed_at(BoundaryPoint::new(first, 0));
        move_boundaries_down(&self.tree, &mut range, root);
        range
    }

    // --- Markup ---

    /// Replace the whole document. History starts over.
    pub fn set_markup(&mut self, source: &str) -> EditorResult<()> {
        let root = self.ctx.root;
        let fragment = markup::parse_fragment(&mut self.tree, source)?;
        let old = self.tree.take_children(root)?;
        self.tree.remove(old)?;
        self.tree.append_child(root, fragment)?;
        self.tree.remove(fragment)?;

        repair_container(&mut self.tree, &mut self.ctx, root);
        self.history.clear();

        let range = match bookmark::restore(&mut self.tree, &self.ctx.schema, root)? {
            Some(range) => range,
            None => self.start_of_document(),
        };
        self.set_selection(range);
        info!(nodes = self.tree.len(), "document loaded");
        Ok(())
    }

    /// Document markup without filler characters
    pub fn markup(&self) -> String {
        markup::serialize_children(&self.tree, self.ctx.root).replace(ZWS, "")
    }

    /// Document markup with the selection bookmarked inside it
    pub fn markup_with_bookmark(&mut self) -> EditorResult<String> {
        let root = self.ctx.root;
        let mut range = self.selection()?;
        bookmark::save(&mut self.tree, &mut range)?;
        let markup = self.markup();
        if let Some(range) = bookmark::restore(&mut self.tree, &self.ctx.schema, root)? {
            self.set_selection(range);
        }
        Ok(markup)
    }

    /// Strip zero-width fillers that are no longer needed
    pub fn remove_fillers(&mut self) {
        let root = self.ctx.root;
        remove_fillers(&mut self.tree, &mut self.ctx, root);
    }

    // --- Commands ---

    /// Paste markup at the selection, replacing any selected content
    pub fn insert_markup(&mut self, source: &str) -> EditorResult<()> {
        let range = self.selection()?;
        let fragment = markup::parse_fragment(&mut self.tree, source)?;
        let mut range = self.checkpoint(range)?;

        remove_empty_inlines(&mut self.tree, &self.ctx.schema, fragment)?;
        self.tree.normalize(fragment)?;
        let mut block = next_block(&self.tree, &self.ctx.schema, fragment, fragment);
        while let Some(node) = block {
            ensure_focusable(&mut self.tree, &mut self.ctx, node);
            block = next_block(&self.tree, &self.ctx.schema, node, fragment);
        }

        if let Err(error) = insert_fragment(&mut self.tree, &mut self.ctx, &mut range, fragment) {
            if self.tree.is_live(fragment) {
                self.tree.remove(fragment)?;
            }
            return Err(error);
        }
        range.collapse(false);

        // The caret goes in front of the last pasted block's filler line break
        let root = self.ctx.root;
        let mut end = range.end;
        while let Some(last) = end
            .offset
            .checked_sub(1)
            .and_then(|index| self.tree.child(end.node, index))
        {
            if self.tree.has_tag(last, "BR") && self.tree.next_sibling(last).is_none() {
                end.offset -= 1;
                break;
            }
            let enterable = self.tree.is_element(last)
                && !is_leaf(&self.tree, last)
                && !self.ctx.schema.is_inline(&self.tree, last)
                && self.tree.is_editable(last, root);
            if !enterable {
                break;
            }
            end = BoundaryPoint::new(last, self.tree.child_count(last));
        }
        range = Range::collapsed_at(end);

        let range = self.repair_around(range)?;
        self.set_selection(range);
        self.mark_changed()?;
        debug!("inserted markup");
        Ok(())
    }

    /// Insert an element at the start of the selection.
    ///
    /// Inline elements go in at the caret. Block elements go after the block holding
    /// the caret, and a default block is added after them when they end the document.
    pub fn insert_element(&mut self, element: Element) -> EditorResult<NodeId> {
        let range = self.selection()?;
        let mut range = self.checkpoint(range)?;
        range.collapse(true);

        let root = self.ctx.root;
        let node = self.tree.create_element(element);

        if self.ctx.schema.is_inline(&self.tree, node) {
            insert_node_in_range(&mut self.tree, &mut range, node)?;
            range.set_start_after(&self.tree, node);
        } else {
            let mut split_node =
                start_block(&self.tree, &self.ctx.schema, &range, root).unwrap_or(root);
            while split_node != root && self.tree.next_sibling(split_node).is_none() {
                split_node = self.tree.parent(split_node).unwrap_or(root);
            }

            let mut node_after_split = None;
            if split_node != root {
                if let (Some(parent), Some(index)) =
                    (self.tree.parent(split_node), self.tree.index_of(split_node))
                {
                    node_after_split = split(&mut self.tree, &mut self.ctx, parent, index + 1, root)?;
                }
            }

            let node_after_split = match node_after_split {
                Some(after) => {
                    self.tree.insert_before(root, node, Some(after))?;
                    after
                }
                None => {
                    self.tree.append_child(root, node)?;
                    let block = self.ctx.create_default_block(&mut self.tree);
                    self.tree.append_child(root, block)?;
                    block
                }
            };

            range = Range::collapsed_at(BoundaryPoint::new(node_after_split, 0));
            move_boundaries_down(&self.tree, &mut range, root);
        }

        self.host.focus();
        self.set_selection(range);
        self.mark_changed()?;
        Ok(node)
    }

    /// Delete the selected content. Returns false for a collapsed selection.
    pub fn delete_selection(&mut self) -> EditorResult<bool> {
        let range = self.selection()?;
        if range.is_collapsed() {
            return Ok(false);
        }

        let mut range = self.checkpoint(range)?;
        let removed = delete_contents(&mut self.tree, &mut self.ctx, &mut range)?;
        self.tree.remove(removed)?;

        let root = self.ctx.root;
        ensure_bottom_line(&mut self.tree, &mut self.ctx, root)?;
        self.set_selection(range);
        self.mark_changed()?;
        Ok(true)
    }

    // --- History ---

    /// Checkpoint the current state before a command
    pub fn save_undo_state(&mut self) -> EditorResult<()> {
        let range = self.selection()?;
        let range = self.checkpoint(range)?;
        self.set_selection(range);
        Ok(())
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        if !self.history.can_undo() {
            return Ok(false);
        }
        let range = self.selection()?;
        let scroll = self.host.scroll_position();
        let Some(restored) = self.history.undo(&mut self.tree, &mut self.ctx, range, scroll)? else {
            return Ok(false);
        };
        self.apply_restored(restored.range, restored.scroll);
        Ok(true)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let scroll = self.host.scroll_position();
        let Some(restored) = self.history.redo(&mut self.tree, &mut self.ctx, scroll)? else {
            return Ok(false);
        };
        self.apply_restored(restored.range, restored.scroll);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The document changed outside the history. Records the first checkpoint when
    /// nothing has been recorded yet.
    pub fn mark_changed(&mut self) -> EditorResult<()> {
        self.history.leave_checkpoint();
        if self.history.is_empty() {
            self.save_undo_state()?;
            self.history.leave_checkpoint();
        }
        Ok(())
    }

    /// Load markup into the document without touching history, as undo does
    pub fn restore_markup(&mut self, source: &str) -> EditorResult<()> {
        let root = self.ctx.root;
        replace_contents(&mut self.tree, &mut self.ctx, root, source)?;
        let range = match bookmark::restore(&mut self.tree, &self.ctx.schema, root)? {
            Some(range) => range,
            None => self.start_of_document(),
        };
        self.set_selection(range);
        Ok(())
    }

    fn checkpoint(&mut self, range: Range) -> EditorResult<Range> {
        let scroll = self.host.scroll_position();
        self.history
            .save_undo_state(&mut self.tree, &mut self.ctx, range, scroll)
    }

    fn apply_restored(&mut self, range: Option<Range>, scroll: ScrollPosition) {
        let range = range.unwrap_or_else(|| self.start_of_document());
        self.host.set_scroll_position(scroll);
        self.set_selection(range);
    }

    /// Full repair pass that keeps the range through a bookmark
    fn repair_around(&mut self, mut range: Range) -> EditorResult<Range> {
        let root = self.ctx.root;
        bookmark::save(&mut self.tree, &mut range)?;
        repair_container(&mut self.tree, &mut self.ctx, root);
        Ok(bookmark::restore(&mut self.tree, &self.ctx.schema, root)?
            .unwrap_or_else(|| self.start_of_document()))
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("tree", &self.tree)
            .field("ctx", &self.ctx)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}
