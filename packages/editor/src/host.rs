//! The seam between the engine and whatever surface displays the document

use serde::{Deserialize, Serialize};

use crate::range::Range;

/// Scroll offsets of the editing surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub left: i64,
    pub top: i64,
}

impl ScrollPosition {
    pub fn new(left: i64, top: i64) -> Self {
        Self { left, top }
    }
}

/// Selection and viewport capabilities supplied by the host.
///
/// Ranges handed back by [`SelectionHost::boundary_pair`] may be reversed; the editor
/// normalizes them before use.
pub trait SelectionHost {
    fn boundary_pair(&self) -> Option<Range>;

    fn set_boundary_pair(&mut self, range: Range);

    fn focus(&mut self);

    fn scroll_position(&self) -> ScrollPosition;

    fn set_scroll_position(&mut self, position: ScrollPosition);
}

/// Host that just remembers what it was told
#[derive(Debug, Clone, Default)]
pub struct MemorySelectionHost {
    range: Option<Range>,
    scroll: ScrollPosition,
    focused: bool,
}

impl MemorySelectionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl SelectionHost for MemorySelectionHost {
    fn boundary_pair(&self) -> Option<Range> {
        self.range
    }

    fn set_boundary_pair(&mut self, range: Range) {
        self.range = Some(range);
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.scroll
    }

    fn set_scroll_position(&mut self, position: ScrollPosition) {
        self.scroll = position;
    }
}
