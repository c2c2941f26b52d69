//! # Boundary & Range Model
//!
//! DOM-style boundary points and ranges over the arena tree.
//!
//! A [`BoundaryPoint`] is `(node, offset)`: a character offset inside a text node, a
//! child index inside an element. A [`Range`] is a `start`/`end` pair. Primitives rely
//! on `start` not coming after `end` in document order; [`Range::new`] never reorders,
//! [`Range::normalized`] does.
//!
//! ## Example
//!
//! ```
//! use folio_dom::{markup, Element, Tree};
//! use folio_editor::range::{BoundaryPoint, Range};
//!
//! let mut tree = Tree::new(Element::new("div"));
//! let root = tree.root();
//! markup::parse_into(&mut tree, root, "<p>hello</p>").unwrap();
//! let text = tree.first_child(tree.first_child(root).unwrap()).unwrap();
//!
//! let range = Range::new(BoundaryPoint::new(text, 5), BoundaryPoint::new(text, 1));
//! assert_eq!(range.normalized(&tree).start.offset, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use folio_dom::{NodeId, Tree};

use crate::schema::{is_leaf, Schema};
use crate::walker::{next_block, previous_block, Show, TreeWalker};

/// A position between two children of an element, or between two characters of a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Point right before `node` in its parent
    pub fn before(tree: &Tree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index_of(node)?))
    }

    /// Point right after `node` in its parent
    pub fn after(tree: &Tree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index_of(node)? + 1))
    }

    /// The node is live and the offset is within its length
    pub fn is_valid(&self, tree: &Tree) -> bool {
        tree.is_live(self.node) && self.offset <= tree.length(self.node)
    }
}

fn position_key(tree: &Tree, point: BoundaryPoint) -> (NodeId, Vec<usize>) {
    let mut key = vec![point.offset];
    let mut current = point.node;
    while let Some(parent) = tree.parent(current) {
        key.push(tree.index_of(current).unwrap_or_default());
        current = parent;
    }
    key.reverse();
    (current, key)
}

/// Document order of two points. `None` when they are in different trees.
pub fn compare_points(tree: &Tree, a: BoundaryPoint, b: BoundaryPoint) -> Option<Ordering> {
    let (top_a, key_a) = position_key(tree, a);
    let (top_b, key_b) = position_key(tree, b);
    (top_a == top_b).then(|| key_a.cmp(&key_b))
}

fn is_before_or_at(tree: &Tree, a: BoundaryPoint, b: BoundaryPoint) -> bool {
    matches!(compare_points(tree, a, b), Some(Ordering::Less | Ordering::Equal))
}

/// Pair of boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    pub fn collapsed_at(point: BoundaryPoint) -> Self {
        Self::new(point, point)
    }

    /// Range covering the contents of `node`
    pub fn contents_of(tree: &Tree, node: NodeId) -> Self {
        Self::new(
            BoundaryPoint::new(node, 0),
            BoundaryPoint::new(node, tree.length(node)),
        )
    }

    /// Range covering `node` itself. Parentless nodes fall back to their contents.
    pub fn around(tree: &Tree, node: NodeId) -> Self {
        match (
            BoundaryPoint::before(tree, node),
            BoundaryPoint::after(tree, node),
        ) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Self::contents_of(tree, node),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    /// Same range with start and end in document order
    pub fn normalized(self, tree: &Tree) -> Self {
        match compare_points(tree, self.start, self.end) {
            Some(Ordering::Greater) => Self::new(self.end, self.start),
            _ => self,
        }
    }

    /// Both points refer to live nodes at valid offsets
    pub fn is_valid(&self, tree: &Tree) -> bool {
        self.start.is_valid(tree) && self.end.is_valid(tree)
    }

    /// Move the start. The end follows if it would otherwise precede the start.
    pub fn set_start(&mut self, tree: &Tree, point: BoundaryPoint) {
        self.start = point;
        if !is_before_or_at(tree, point, self.end) {
            self.end = point;
        }
    }

    /// Move the end. The start follows if it would otherwise follow the end.
    pub fn set_end(&mut self, tree: &Tree, point: BoundaryPoint) {
        self.end = point;
        if !is_before_or_at(tree, self.start, point) {
            self.start = point;
        }
    }

    pub fn set_start_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = BoundaryPoint::before(tree, node) {
            self.set_start(tree, point);
        }
    }

    pub fn set_start_after(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = BoundaryPoint::after(tree, node) {
            self.set_start(tree, point);
        }
    }

    pub fn set_end_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = BoundaryPoint::before(tree, node) {
            self.set_end(tree, point);
        }
    }

    pub fn set_end_after(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = BoundaryPoint::after(tree, node) {
            self.set_end(tree, point);
        }
    }

    /// Deepest node containing both points
    pub fn common_ancestor(&self, tree: &Tree) -> Option<NodeId> {
        std::iter::once(self.start.node)
            .chain(tree.ancestors(self.start.node))
            .find(|&candidate| tree.contains(candidate, self.end.node))
    }

    /// Whether `node` lies inside the range. With `partial`, any overlap counts.
    pub fn contains_node(&self, tree: &Tree, node: NodeId, partial: bool) -> bool {
        let extent = Range::around(tree, node);
        if partial {
            let ends_before_start = matches!(
                compare_points(tree, self.start, extent.end),
                Some(Ordering::Greater | Ordering::Equal)
            );
            let starts_after_end = matches!(
                compare_points(tree, self.end, extent.start),
                Some(Ordering::Less | Ordering::Equal)
            );
            compare_points(tree, self.start, extent.end).is_some()
                && !ends_before_start
                && !starts_after_end
        } else {
            is_before_or_at(tree, self.start, extent.start)
                && is_before_or_at(tree, extent.end, self.end)
        }
    }
}

/// Node just before the point, descending to the deepest last child. The container
/// itself when the point is at offset 0 or inside text.
pub fn node_before(tree: &Tree, point: BoundaryPoint) -> NodeId {
    let mut node = point.node;
    let mut offset = point.offset;
    while offset > 0 && tree.is_element(node) {
        match tree.child(node, offset - 1) {
            Some(child) => {
                node = child;
                offset = tree.child_count(node);
            }
            None => break,
        }
    }
    node
}

/// Node just after the point. Text containers are returned as is; past the last
/// child, the next sibling of the nearest ancestor that has one.
pub fn node_after(tree: &Tree, point: BoundaryPoint) -> Option<NodeId> {
    if !tree.is_element(point.node) {
        return Some(point.node);
    }
    if let Some(child) = tree.child(point.node, point.offset) {
        return Some(child);
    }
    let mut node = point.node;
    loop {
        if let Some(sibling) = tree.next_sibling(node) {
            return Some(sibling);
        }
        node = tree.parent(node)?;
    }
}

/// Push both boundaries down into the deepest editable position, into text where
/// possible, without entering leaves or non-editable elements.
///
/// On a collapsed range the start receives the position found from the end side and
/// the end the one found from the start side.
pub fn move_boundaries_down(tree: &Tree, range: &mut Range, root: NodeId) {
    let descends = |child: &NodeId| !is_leaf(tree, *child) && tree.is_editable(*child, root);

    let mut start = range.start;
    while !tree.is_text(start.node) {
        let Some(child) = tree.child(start.node, start.offset).filter(descends) else {
            break;
        };
        start = BoundaryPoint::new(child, 0);
    }

    let mut end = range.end;
    if end.offset > 0 {
        while !tree.is_text(end.node) {
            let Some(child) = end
                .offset
                .checked_sub(1)
                .and_then(|index| tree.child(end.node, index))
                .filter(descends)
            else {
                break;
            };
            end = BoundaryPoint::new(child, tree.length(child));
        }
    } else {
        while !tree.is_text(end.node) {
            let Some(child) = tree.first_child(end.node).filter(descends) else {
                break;
            };
            end = BoundaryPoint::new(child, 0);
        }
    }

    if range.is_collapsed() {
        range.set_start(tree, end);
        range.set_end(tree, start);
    } else {
        range.set_start(tree, start);
        range.set_end(tree, end);
    }
}

/// Lift both boundaries while they sit at the very start (start) or very end (end) of
/// their container, stopping at `common` (the common ancestor when `None`).
pub fn move_boundaries_up(tree: &Tree, range: &mut Range, common: Option<NodeId>) {
    let Some(common) = common.or_else(|| range.common_ancestor(tree)) else {
        return;
    };

    let mut start = range.start;
    while start.node != common && start.offset == 0 {
        match BoundaryPoint::before(tree, start.node) {
            Some(point) => start = point,
            None => break,
        }
    }

    let mut end = range.end;
    while end.node != common && end.offset == tree.length(end.node) {
        match BoundaryPoint::after(tree, end.node) {
            Some(point) => end = point,
            None => break,
        }
    }

    range.set_start(tree, start);
    range.set_end(tree, end);
}

/// First block at least partially inside the range
pub fn start_block(tree: &Tree, schema: &Schema, range: &Range, root: NodeId) -> Option<NodeId> {
    let container = range.start.node;
    let block = if schema.is_inline(tree, container) {
        previous_block(tree, schema, container, root)
    } else if schema.is_block(tree, container) {
        Some(container)
    } else {
        let before = node_before(tree, range.start);
        next_block(tree, schema, before, root)
    };
    block.filter(|&block| range.contains_node(tree, block, true))
}

/// Last block at least partially inside the range
pub fn end_block(tree: &Tree, schema: &Schema, range: &Range, root: NodeId) -> Option<NodeId> {
    let container = range.end.node;
    let block = if schema.is_inline(tree, container) {
        previous_block(tree, schema, container, root)
    } else if schema.is_block(tree, container) {
        Some(container)
    } else {
        let after = node_after(tree, range.end).unwrap_or_else(|| {
            let mut last = root;
            while let Some(child) = tree.last_child(last) {
                last = child;
            }
            last
        });
        previous_block(tree, schema, after, root)
    };
    block.filter(|&block| range.contains_node(tree, block, true))
}

/// Non-whitespace text or an image
fn is_visible_content(tree: &Tree, node: NodeId) -> bool {
    match tree.text(node) {
        Some(data) => data.chars().any(|c| !matches!(c, ' ' | '\t' | '\r' | '\n')),
        None => tree.has_tag(node, "IMG"),
    }
}

/// No visible content between the start of the range and the start of its block
pub fn range_starts_at_block_boundary(
    tree: &Tree,
    schema: &Schema,
    range: &Range,
    root: NodeId,
) -> bool {
    let start = range.start;
    let current = if tree.is_text(start.node) {
        if start.offset > 0 {
            return false;
        }
        Some(start.node)
    } else {
        node_after(tree, start)
    };

    let scope = start_block(tree, schema, range, root).unwrap_or(root);
    let walker = TreeWalker::new(tree, scope, Show::All, is_visible_content);
    match current {
        Some(node) => walker.starting_at(node).previous_node().is_none(),
        None => {
            let mut walker = walker;
            walker.next_node().is_none()
        }
    }
}

/// No visible content between the end of the range and the end of its block
pub fn range_ends_at_block_boundary(
    tree: &Tree,
    schema: &Schema,
    range: &Range,
    root: NodeId,
) -> bool {
    let end = range.end;
    let current = match tree.text(end.node) {
        Some(data) => {
            let length = data.chars().count();
            if length > 0 && end.offset < length {
                return false;
            }
            end.node
        }
        None => node_before(tree, end),
    };

    let scope = end_block(tree, schema, range, root).unwrap_or(root);
    TreeWalker::new(tree, scope, Show::All, is_visible_content)
        .starting_at(current)
        .next_node()
        .is_none()
}

/// Widen the range to cover whole blocks. A non-editable ancestor of the range is
/// taken as a single unit instead.
pub fn expand_to_block_boundaries(tree: &Tree, schema: &Schema, range: &mut Range, root: NodeId) {
    let mut untouchable = None;
    let mut node = range.common_ancestor(tree);
    while let Some(current) = node {
        if current == root {
            break;
        }
        if tree.element(current).is_some_and(|element| !element.editable) {
            untouchable = Some(current);
        }
        node = tree.parent(current);
    }

    let (first, last) = match untouchable {
        Some(atom) => (Some(atom), Some(atom)),
        None => (
            start_block(tree, schema, range, root),
            end_block(tree, schema, range, root),
        ),
    };

    if let (Some(first), Some(last)) = (first, last) {
        if let (Some(start), Some(end)) = (
            BoundaryPoint::before(tree, first),
            BoundaryPoint::after(tree, last),
        ) {
            *range = Range::new(start, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use folio_dom::{markup, Element};

    fn document(source: &str) -> Tree {
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        markup::parse_into(&mut tree, root, source).unwrap();
        tree
    }

    fn schema() -> Schema {
        Schema::new(SchemaConfig::default())
    }

    /// Text node of the `index`-th paragraph
    fn text_of(tree: &Tree, index: usize) -> NodeId {
        let p = tree.child(tree.root(), index).unwrap();
        tree.first_child(p).unwrap()
    }

    #[test]
    fn test_compare_points_in_document_order() {
        let tree = document("<p>ab</p><p>cd</p>");
        let root = tree.root();
        let first = text_of(&tree, 0);
        let second = text_of(&tree, 1);
        let p1 = tree.child(root, 0).unwrap();

        let a = BoundaryPoint::new(first, 2);
        let b = BoundaryPoint::new(second, 0);
        assert_eq!(compare_points(&tree, a, b), Some(Ordering::Less));
        assert_eq!(compare_points(&tree, b, a), Some(Ordering::Greater));
        assert_eq!(compare_points(&tree, a, a), Some(Ordering::Equal));

        // Before a child precedes everything inside it
        let before_p1 = BoundaryPoint::new(root, 0);
        assert_eq!(
            compare_points(&tree, before_p1, BoundaryPoint::new(p1, 0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_points(&tree, BoundaryPoint::new(root, 1), a),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_points_in_detached_subtrees_are_unordered() {
        let mut tree = document("<p>ab</p>");
        let loose = tree.create_text("x");
        let first = text_of(&tree, 0);

        assert_eq!(
            compare_points(
                &tree,
                BoundaryPoint::new(first, 0),
                BoundaryPoint::new(loose, 0)
            ),
            None
        );
    }

    #[test]
    fn test_set_start_after_end_collapses() {
        let tree = document("<p>ab</p><p>cd</p>");
        let first = text_of(&tree, 0);
        let second = text_of(&tree, 1);
        let mut range = Range::collapsed_at(BoundaryPoint::new(first, 1));

        range.set_start(&tree, BoundaryPoint::new(second, 1));

        assert!(range.is_collapsed());
        assert_eq!(range.end, BoundaryPoint::new(second, 1));
    }

    #[test]
    fn test_full_containment_implies_partial() {
        let tree = document("<p>ab</p><p>cd</p><p>ef</p>");
        let root = tree.root();
        let range = Range::new(
            BoundaryPoint::new(text_of(&tree, 0), 1),
            BoundaryPoint::new(root, 2),
        );
        let nodes = tree.descendants(root);

        for &node in &nodes {
            if range.contains_node(&tree, node, false) {
                assert!(range.contains_node(&tree, node, true));
            }
        }

        let p1 = tree.child(root, 0).unwrap();
        let p2 = tree.child(root, 1).unwrap();
        let p3 = tree.child(root, 2).unwrap();
        assert!(range.contains_node(&tree, p1, true));
        assert!(!range.contains_node(&tree, p1, false));
        assert!(range.contains_node(&tree, p2, false));
        assert!(!range.contains_node(&tree, p3, true));
    }

    #[test]
    fn test_common_ancestor() {
        let tree = document("<p>ab<b>cd</b></p><p>ef</p>");
        let root = tree.root();
        let p1 = tree.child(root, 0).unwrap();
        let bold_text = tree.first_child(tree.child(p1, 1).unwrap()).unwrap();

        let inner = Range::new(
            BoundaryPoint::new(text_of(&tree, 0), 0),
            BoundaryPoint::new(bold_text, 1),
        );
        assert_eq!(inner.common_ancestor(&tree), Some(p1));

        let across = Range::new(
            BoundaryPoint::new(bold_text, 0),
            BoundaryPoint::new(text_of(&tree, 1), 1),
        );
        assert_eq!(across.common_ancestor(&tree), Some(root));
    }

    #[test]
    fn test_node_before_and_after() {
        let tree = document("<p>ab<b>cd</b></p><p>ef</p>");
        let root = tree.root();
        let p1 = tree.child(root, 0).unwrap();
        let p2 = tree.child(root, 1).unwrap();
        let bold = tree.child(p1, 1).unwrap();
        let bold_text = tree.first_child(bold).unwrap();

        assert_eq!(node_before(&tree, BoundaryPoint::new(root, 1)), bold_text);
        assert_eq!(node_before(&tree, BoundaryPoint::new(p1, 0)), p1);
        assert_eq!(node_after(&tree, BoundaryPoint::new(p1, 1)), Some(bold));
        assert_eq!(node_after(&tree, BoundaryPoint::new(p1, 2)), Some(p2));
        assert_eq!(node_after(&tree, BoundaryPoint::new(root, 2)), None);
    }

    #[test]
    fn test_move_down_swaps_collapsed_boundaries() {
        let tree = document("<p>ab<b>cd</b></p>");
        let root = tree.root();
        let p = tree.child(root, 0).unwrap();
        let ab = tree.first_child(p).unwrap();
        let cd = tree.first_child(tree.child(p, 1).unwrap()).unwrap();
        let mut range = Range::collapsed_at(BoundaryPoint::new(p, 1));

        move_boundaries_down(&tree, &mut range, root);

        assert_eq!(range.start, BoundaryPoint::new(ab, 2));
        assert_eq!(range.end, BoundaryPoint::new(cd, 0));
    }

    #[test]
    fn test_move_down_stops_at_non_editable() {
        let tree = document(
            r#"<mywo-content-widget contenteditable="false"><p>x</p></mywo-content-widget>"#,
        );
        let root = tree.root();
        let mut range = Range::new(BoundaryPoint::new(root, 0), BoundaryPoint::new(root, 1));

        move_boundaries_down(&tree, &mut range, root);

        assert_eq!(range.start, BoundaryPoint::new(root, 0));
        assert_eq!(range.end, BoundaryPoint::new(root, 1));
    }

    #[test]
    fn test_move_up_to_common_ancestor() {
        let tree = document("<p>ab</p><p>cd</p>");
        let root = tree.root();
        let mut range = Range::new(
            BoundaryPoint::new(text_of(&tree, 0), 0),
            BoundaryPoint::new(text_of(&tree, 1), 2),
        );

        move_boundaries_up(&tree, &mut range, None);

        assert_eq!(range.start, BoundaryPoint::new(root, 0));
        assert_eq!(range.end, BoundaryPoint::new(root, 2));
    }

    #[test]
    fn test_start_and_end_blocks() {
        let tree = document("<p>ab</p><p>cd</p><p>ef</p>");
        let root = tree.root();
        let schema = schema();
        let p1 = tree.child(root, 0).unwrap();
        let p2 = tree.child(root, 1).unwrap();

        let range = Range::new(
            BoundaryPoint::new(text_of(&tree, 0), 1),
            BoundaryPoint::new(text_of(&tree, 1), 1),
        );
        assert_eq!(start_block(&tree, &schema, &range, root), Some(p1));
        assert_eq!(end_block(&tree, &schema, &range, root), Some(p2));

        let between = Range::new(BoundaryPoint::new(root, 1), BoundaryPoint::new(root, 2));
        assert_eq!(start_block(&tree, &schema, &between, root), Some(p2));
        assert_eq!(end_block(&tree, &schema, &between, root), Some(p2));
    }

    #[test]
    fn test_block_boundary_checks() {
        let tree = document("<p>  ab</p>");
        let root = tree.root();
        let schema = schema();
        let text = text_of(&tree, 0);

        let at_start = Range::collapsed_at(BoundaryPoint::new(text, 0));
        assert!(range_starts_at_block_boundary(&tree, &schema, &at_start, root));
        assert!(!range_ends_at_block_boundary(&tree, &schema, &at_start, root));

        let middle = Range::collapsed_at(BoundaryPoint::new(text, 3));
        assert!(!range_starts_at_block_boundary(&tree, &schema, &middle, root));

        let at_end = Range::collapsed_at(BoundaryPoint::new(text, 4));
        assert!(range_ends_at_block_boundary(&tree, &schema, &at_end, root));
    }

    #[test]
    fn test_expand_to_block_boundaries() {
        let tree = document("<p>ab</p><p>cd</p>");
        let root = tree.root();
        let schema = schema();
        let mut range = Range::collapsed_at(BoundaryPoint::new(text_of(&tree, 1), 1));

        expand_to_block_boundaries(&tree, &schema, &mut range, root);

        assert_eq!(range.start, BoundaryPoint::new(root, 1));
        assert_eq!(range.end, BoundaryPoint::new(root, 2));
    }

    #[test]
    fn test_expand_snaps_to_non_editable_ancestor() {
        let tree = document(
            r#"<p>a</p><mywo-content-widget contenteditable="false"><p>x</p></mywo-content-widget>"#,
        );
        let root = tree.root();
        let schema = schema();
        let widget = tree.child(root, 1).unwrap();
        let inner = tree.first_child(tree.first_child(widget).unwrap()).unwrap();
        let mut range = Range::collapsed_at(BoundaryPoint::new(inner, 0));

        expand_to_block_boundaries(&tree, &schema, &mut range, root);

        assert_eq!(range, Range::around(&tree, widget));
    }
}
