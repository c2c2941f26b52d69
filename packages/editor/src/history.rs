//! # Undo History
//!
//! Linear list of markup snapshots with a cursor.
//!
//! ## Design
//!
//! - A snapshot is the serialized root content with the selection bookmarked inside it
//! - Recording is a no-op while the history is already in a checkpoint, so a run of
//!   keystrokes between two commands collapses into one step
//! - Any native change to the document ([`History::leave_checkpoint`]) makes the next
//!   recording take effect
//! - Recording truncates the redo tail
//! - Undo first records the live state (when it isn't already a checkpoint) so it can
//!   be redone
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//!
//! // Before a destructive command
//! let range = history.save_undo_state(&mut tree, &mut ctx, range, scroll)?;
//!
//! // ... command runs, then the host reports the change
//! history.leave_checkpoint();
//!
//! // Undo
//! if let Some(restored) = history.undo(&mut tree, &mut ctx, range, scroll)? {
//!     host.set_boundary_pair(restored.range.unwrap());
//! }
//! ```

use tracing::debug;

use folio_dom::{markup, NodeId, Tree};

use crate::bookmark;
use crate::context::EditorContext;
use crate::errors::EditorResult;
use crate::host::ScrollPosition;
use crate::range::{move_boundaries_down, BoundaryPoint, Range};
use crate::repair::{ensure_focusable, repair_container};
use crate::walker::next_block;

/// One recorded document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Root inner markup including the bookmark markers
    pub markup: String,

    /// Scroll offsets to return to. The first snapshot has none.
    pub scroll: Option<ScrollPosition>,
}

/// What the tree looks like after stepping through history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restored {
    pub range: Option<Range>,
    pub scroll: ScrollPosition,
}

/// Undo/redo history for one editing session
#[derive(Debug)]
pub struct History {
    snapshots: Vec<Snapshot>,

    /// Index of the current snapshot; `None` until the first recording
    cursor: Option<usize>,

    /// The live document equals the snapshot at `cursor`
    in_checkpoint: bool,

    /// Maximum number of snapshots kept (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create a history with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            in_checkpoint: false,
            max_levels,
        }
    }

    /// Record the live document unless it already is a checkpoint (or `replace` is set).
    ///
    /// The selection is bookmarked before the tree is repaired, so repair can merge or
    /// drop the nodes `range` pointed into. The markers are left in place with `range`
    /// between them; the caller restores or discards them. Nothing is recorded and
    /// the tree is left as it was when the bookmark cannot be placed.
    pub fn record_checkpoint(
        &mut self,
        tree: &mut Tree,
        ctx: &mut EditorContext,
        range: &mut Range,
        scroll: ScrollPosition,
        replace: bool,
    ) -> EditorResult<bool> {
        if self.in_checkpoint && !replace {
            return Ok(false);
        }

        let root = ctx.root;
        if let Err(error) = bookmark::save(tree, range) {
            bookmark::remove(tree, root)?;
            return Err(error);
        }
        repair_container(tree, ctx, root);
        *range = match bookmark::range_between(tree, root) {
            Some(between) => between,
            None => {
                // Repair dropped the block holding the markers
                let mut fallback = Range::collapsed_at(BoundaryPoint::new(root, 0));
                move_boundaries_down(tree, &mut fallback, root);
                fallback
            }
        };

        let index = self.cursor.map_or(0, |cursor| cursor + 1);
        self.snapshots.truncate(index);
        self.snapshots.push(Snapshot {
            markup: markup::serialize_children(tree, root),
            scroll: (index > 0).then_some(scroll),
        });
        self.cursor = Some(index);

        if self.max_levels > 0 && self.snapshots.len() > self.max_levels {
            let excess = self.snapshots.len() - self.max_levels;
            self.snapshots.drain(..excess);
            self.cursor = Some(index - excess);
        }

        self.in_checkpoint = true;
        debug!(index, levels = self.snapshots.len(), "recorded checkpoint");
        Ok(true)
    }

    /// Checkpoint before a destructive command. Returns the range recovered from the
    /// bookmark, or the given range unchanged when nothing was recorded.
    pub fn save_undo_state(
        &mut self,
        tree: &mut Tree,
        ctx: &mut EditorContext,
        mut range: Range,
        scroll: ScrollPosition,
    ) -> EditorResult<Range> {
        if self.in_checkpoint {
            return Ok(range);
        }

        self.record_checkpoint(tree, ctx, &mut range, scroll, false)?;
        let root = ctx.root;
        Ok(bookmark::restore(tree, &ctx.schema, root)?.unwrap_or(range))
    }

    /// Step back one snapshot. `None` when there is nothing to undo.
    pub fn undo(
        &mut self,
        tree: &mut Tree,
        ctx: &mut EditorContext,
        mut range: Range,
        scroll: ScrollPosition,
    ) -> EditorResult<Option<Restored>> {
        let Some(cursor) = self.cursor else {
            return Ok(None);
        };
        if cursor == 0 && self.in_checkpoint {
            return Ok(None);
        }

        self.record_checkpoint(tree, ctx, &mut range, scroll, false)?;
        let Some(cursor) = self.cursor.and_then(|cursor| cursor.checked_sub(1)) else {
            return Ok(None);
        };
        self.cursor = Some(cursor);

        let restored = self.load(tree, ctx, cursor, scroll)?;
        self.in_checkpoint = true;
        debug!(cursor, "undo");
        Ok(Some(restored))
    }

    /// Step forward one snapshot. `None` when there is nothing to redo.
    pub fn redo(
        &mut self,
        tree: &mut Tree,
        ctx: &mut EditorContext,
        scroll: ScrollPosition,
    ) -> EditorResult<Option<Restored>> {
        if !self.can_redo() {
            return Ok(None);
        }
        let cursor = self.cursor.map_or(0, |cursor| cursor + 1);
        self.cursor = Some(cursor);

        let restored = self.load(tree, ctx, cursor, scroll)?;
        debug!(cursor, "redo");
        Ok(Some(restored))
    }

    pub fn can_undo(&self) -> bool {
        match self.cursor {
            Some(cursor) => cursor > 0 || !self.in_checkpoint,
            None => false,
        }
    }

    pub fn can_redo(&self) -> bool {
        self.in_checkpoint
            && self
                .cursor
                .is_some_and(|cursor| cursor + 1 < self.snapshots.len())
    }

    /// The live document has diverged from the current snapshot
    pub fn leave_checkpoint(&mut self) {
        self.in_checkpoint = false;
    }

    pub fn is_in_checkpoint(&self) -> bool {
        self.in_checkpoint
    }

    /// Nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }

    /// Get the number of snapshots held
    pub fn levels(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Forget every snapshot
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
        self.in_checkpoint = false;
    }

    fn load(
        &self,
        tree: &mut Tree,
        ctx: &mut EditorContext,
        index: usize,
        current_scroll: ScrollPosition,
    ) -> EditorResult<Restored> {
        let Some(snapshot) = self.snapshots.get(index) else {
            return Ok(Restored {
                range: None,
                scroll: current_scroll,
            });
        };

        let root = ctx.root;
        replace_contents(tree, ctx, root, &snapshot.markup)?;
        let range = bookmark::restore(tree, &ctx.schema, root)?;

        Ok(Restored {
            range,
            scroll: snapshot.scroll.unwrap_or(current_scroll),
        })
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

/// Swap the content of `root` for freshly parsed markup and make every block focusable
pub(crate) fn replace_contents(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    root: NodeId,
    source: &str,
) -> EditorResult<()> {
    let fragment = markup::parse_fragment(tree, source)?;
    let old = tree.take_children(root)?;
    tree.remove(old)?;
    tree.append_child(root, fragment)?;
    tree.remove(fragment)?;

    ensure_focusable(tree, ctx, root);
    let mut block = next_block(tree, &ctx.schema, root, root);
    while let Some(node) = block {
        ensure_focusable(tree, ctx, node);
        block = next_block(tree, &ctx.schema, node, root);
    }
    Ok(())
}
