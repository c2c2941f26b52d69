//! Selection bookmarks
//!
//! A selection survives serialization as two hidden `INPUT` markers. Restoring finds
//! the markers, turns their positions back into a range, removes them and re-merges
//! the text they split.

use std::cmp::Ordering;

use folio_dom::{Element, NodeId, Tree};

use crate::errors::EditorResult;
use crate::mutation::insert_node_in_range;
use crate::range::{compare_points, BoundaryPoint, Range};
use crate::schema::{is_leaf, Schema};
use crate::split_merge::merge_inlines;

pub const START_MARKER_ID: &str = "folio-selection-start";
pub const END_MARKER_ID: &str = "folio-selection-end";

fn marker(id: &str) -> Element {
    Element::new("INPUT")
        .with_attr("id", id)
        .with_attr("type", "hidden")
}

fn marker_id(tree: &Tree, node: NodeId) -> Option<&str> {
    tree.element(node)
        .filter(|element| element.has_tag("INPUT"))
        .and_then(|element| element.attr("id"))
        .filter(|id| *id == START_MARKER_ID || *id == END_MARKER_ID)
}

/// Whether `node` is one of the two bookmark markers
pub fn is_marker(tree: &Tree, node: NodeId) -> bool {
    marker_id(tree, node).is_some()
}

fn find_marker(tree: &Tree, root: NodeId, id: &str) -> Option<NodeId> {
    tree.find_descendant(root, |tree, node| marker_id(tree, node) == Some(id))
}

/// Place the markers at the range boundaries. The range is left between them.
pub fn save(tree: &mut Tree, range: &mut Range) -> EditorResult<()> {
    let mut start = tree.create_element(marker(START_MARKER_ID));
    let mut end = tree.create_element(marker(END_MARKER_ID));

    insert_node_in_range(tree, range, start)?;
    range.collapse(false);
    insert_node_in_range(tree, range, end)?;

    // On a collapsed range the start marker can land after the end marker
    let order = match (
        BoundaryPoint::before(tree, start),
        BoundaryPoint::before(tree, end),
    ) {
        (Some(a), Some(b)) => compare_points(tree, a, b),
        _ => None,
    };
    if order == Some(Ordering::Greater) {
        if let Some(element) = tree.element_mut(start) {
            element.set_attr("id", END_MARKER_ID);
        }
        if let Some(element) = tree.element_mut(end) {
            element.set_attr("id", START_MARKER_ID);
        }
        std::mem::swap(&mut start, &mut end);
    }

    range.set_start_after(tree, start);
    range.set_end_before(tree, end);
    Ok(())
}

/// Turn the markers under `root` back into a range and remove them.
/// `None` when the markers are missing.
pub fn restore(tree: &mut Tree, schema: &Schema, root: NodeId) -> EditorResult<Option<Range>> {
    let (Some(start), Some(end)) = (
        find_marker(tree, root, START_MARKER_ID),
        find_marker(tree, root, END_MARKER_ID),
    ) else {
        return Ok(None);
    };
    let (Some(first), Some(second)) = (
        BoundaryPoint::before(tree, start),
        BoundaryPoint::before(tree, end),
    ) else {
        return Ok(None);
    };

    // The markers may come back in either document order
    let (start_point, mut end_point) = match compare_points(tree, first, second) {
        Some(Ordering::Greater) => (second, first),
        _ => (first, second),
    };
    if start_point.node == end_point.node {
        end_point.offset = end_point.offset.saturating_sub(1);
    }
    tree.remove(start)?;
    tree.remove(end)?;

    let mut range = Range::new(start_point, end_point);
    merge_inlines(tree, schema, start_point.node, &mut range)?;
    if start_point.node != end_point.node {
        merge_inlines(tree, schema, end_point.node, &mut range)?;
    }

    // Step into adjacent text when the markers sat between elements
    if range.is_collapsed() && tree.is_element(range.start.node) {
        let container = range.start.node;
        let offset = range.start.offset;
        let after = tree.child(container, offset).filter(|&n| tree.is_text(n));
        let before = offset
            .checked_sub(1)
            .and_then(|i| tree.child(container, i))
            .and_then(|node| last_text_within(tree, schema, node));
        if let Some(text) = after {
            range = Range::collapsed_at(BoundaryPoint::new(text, 0));
        } else if let Some(text) = before {
            range = Range::collapsed_at(BoundaryPoint::new(text, tree.length(text)));
        }
    }

    Ok(Some(range))
}

/// `node` itself when it is text, otherwise the last text inside a chain of inline
/// elements ending at `node`
fn last_text_within(tree: &Tree, schema: &Schema, node: NodeId) -> Option<NodeId> {
    let mut node = node;
    while !tree.is_text(node) {
        if is_leaf(tree, node) || !schema.is_inline(tree, node) {
            return None;
        }
        node = tree.last_child(node)?;
    }
    Some(node)
}

/// Range between the markers under `root`, leaving them in place
pub fn range_between(tree: &Tree, root: NodeId) -> Option<Range> {
    let start = find_marker(tree, root, START_MARKER_ID)?;
    let end = find_marker(tree, root, END_MARKER_ID)?;
    Some(Range::new(
        BoundaryPoint::after(tree, start)?,
        BoundaryPoint::before(tree, end)?,
    ))
}

/// Strip both markers without computing a range
pub fn remove(tree: &mut Tree, root: NodeId) -> EditorResult<()> {
    for id in [START_MARKER_ID, END_MARKER_ID] {
        if let Some(node) = find_marker(tree, root, id) {
            tree.remove(node)?;
        }
    }
    Ok(())
}
