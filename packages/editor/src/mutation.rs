//! # Range Mutation Primitives
//!
//! Insertion, extraction and deletion of the content covered by a [`Range`].
//!
//! ## Design
//!
//! One logical edit runs through the same steps:
//!
//! 1. Boundaries inside a non-editable element are widened to cover all of it
//! 2. `extract_contents` splits both boundaries up to their common container and lifts
//!    the nodes in between into a fragment
//! 3. `delete_contents` merges the two blocks left on either side of the gap
//! 4. `insert_fragment` splits at the caret and drops the fragment into the gap
//!
//! Every primitive leaves the range at a well-defined position. A full repair pass
//! after a compound command is the caller's job.

use tracing::{debug, instrument};

use folio_dom::{NodeId, Tree};

use crate::context::EditorContext;
use crate::diagnostics::Diagnostic;
use crate::errors::{EditorError, EditorResult};
use crate::range::{
    end_block, move_boundaries_down, move_boundaries_up, start_block, BoundaryPoint, Range,
};
use crate::repair::ensure_focusable;
use crate::schema::is_leaf;
use crate::split_merge::{merge_containers, merge_with_block, split};
use crate::walker::{nearest, next_block, previous_block};

/// Reject a range that points outside the root, at removed nodes or past the end of a node
pub(crate) fn check_range(tree: &Tree, ctx: &mut EditorContext, range: &Range) -> EditorResult<()> {
    for point in [range.start, range.end] {
        if !point.is_valid(tree) || !tree.contains(ctx.root, point.node) {
            let error = EditorError::DetachedBoundary { node: point.node };
            ctx.report(Diagnostic::contract(error.to_string()));
            return Err(error);
        }
    }
    Ok(())
}

/// Insert `node` (or the children of a fragment) at the start of the range, splitting
/// a text node when the start is inside one. The range ends up around the inserted
/// content.
pub fn insert_node_in_range(tree: &mut Tree, range: &mut Range, node: NodeId) -> EditorResult<()> {
    let mut start = range.start;
    let mut end = range.end;

    if tree.is_text(start.node) {
        let text = start.node;
        let parent = tree
            .parent(text)
            .ok_or(EditorError::DetachedBoundary { node: text })?;
        if start.offset == tree.length(text) {
            start.offset = tree.index_of(text).unwrap_or_default() + 1;
            if range.is_collapsed() {
                end = BoundaryPoint::new(parent, start.offset);
            }
        } else {
            let mut container = text;
            if start.offset > 0 {
                let after = tree.split_text(text, start.offset)?;
                if end.node == text {
                    end = BoundaryPoint::new(after, end.offset - start.offset);
                } else if end.node == parent {
                    end.offset += 1;
                }
                container = after;
            }
            start.offset = tree.index_of(container).unwrap_or_default();
        }
        start.node = parent;
    }

    let count_before = tree.child_count(start.node);
    let reference = tree.child(start.node, start.offset);
    tree.insert_before(start.node, node, reference)?;

    if start.node == end.node {
        end.offset += tree.child_count(start.node) - count_before;
    }

    range.set_start(tree, start);
    range.set_end(tree, end);
    Ok(())
}

/// Widen the range so it never starts or ends inside a non-editable element
pub fn encapsulate_non_editable(tree: &Tree, range: &mut Range, root: NodeId) {
    let mut node = Some(range.start.node);
    while let Some(current) = node.filter(|&n| n != root) {
        if tree.is_element(current) && !tree.is_editable(current, root) {
            range.set_start_before(tree, current);
        }
        node = tree.parent(current);
    }

    let mut node = Some(range.end.node);
    while let Some(current) = node.filter(|&n| n != root) {
        if tree.is_element(current) && !tree.is_editable(current, root) {
            range.set_end_after(tree, current);
        }
        node = tree.parent(current);
    }
}

/// Lift everything between the range boundaries into a new fragment and collapse the
/// range at the gap. `common` defaults to the range's common ancestor.
pub fn extract_contents(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    range: &mut Range,
    common: Option<NodeId>,
) -> EditorResult<NodeId> {
    check_range(tree, ctx, range)?;
    let common = match common.or_else(|| range.common_ancestor(tree)) {
        Some(common) => common,
        None => {
            return Err(EditorError::DetachedBoundary {
                node: range.end.node,
            })
        }
    };
    let common = if tree.is_text(common) {
        tree.parent(common)
            .ok_or(EditorError::DetachedBoundary { node: common })?
    } else {
        common
    };

    let end_node = split(tree, ctx, range.end.node, range.end.offset, common)?;
    let start_node = split(tree, ctx, range.start.node, range.start.offset, common)?;

    let fragment = tree.create_fragment();
    let mut current = start_node;
    while current != end_node {
        let Some(node) = current else {
            break;
        };
        current = tree.next_sibling(node);
        tree.append_child(fragment, node)?;
    }

    let offset = end_node
        .and_then(|node| tree.index_of(node))
        .unwrap_or_else(|| tree.child_count(common));
    let mut point = BoundaryPoint::new(common, offset);

    // Rejoin text exposed on both sides of the gap
    let after = tree.child(common, offset);
    let before = after.and_then(|after| tree.previous_sibling(after));
    if let (Some(before), Some(after)) = (before, after) {
        if let (true, Some(data)) = (tree.is_text(before), tree.text(after).map(str::to_owned)) {
            point = BoundaryPoint::new(before, tree.length(before));
            tree.append_text(before, &data)?;
            tree.remove(after)?;
        }
    }

    *range = Range::collapsed_at(point);
    ensure_focusable(tree, ctx, common);

    Ok(fragment)
}

/// Delete the content of the range, merging the blocks on either side of the gap.
/// Returns the removed content as a fragment owned by the caller.
#[instrument(level = "debug", skip(tree, ctx))]
pub fn delete_contents(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    range: &mut Range,
) -> EditorResult<NodeId> {
    check_range(tree, ctx, range)?;
    let root = ctx.root;

    encapsulate_non_editable(tree, range, root);
    move_boundaries_up(tree, range, None);

    // A boundary lifted out of its block means the whole block goes
    let holds_text = |tree: &Tree, node: NodeId| {
        ctx.schema.is_inline(tree, node) || ctx.schema.is_block(tree, node)
    };
    let needs_merge = holds_text(tree, range.start.node) && holds_text(tree, range.end.node);

    let fragment = extract_contents(tree, ctx, range, None)?;

    move_boundaries_down(tree, range, root);

    let first = start_block(tree, &ctx.schema, range, root);
    if needs_merge {
        let last = end_block(tree, &ctx.schema, range, root);
        if let (Some(first), Some(last)) = (first, last) {
            if first != last {
                merge_with_block(tree, ctx, first, last, range)?;
            }
        }
    }

    if let Some(first) = first.filter(|&first| tree.is_live(first)) {
        ensure_focusable(tree, ctx, first);
    }

    // The root always keeps a block
    let child = tree.first_child(root);
    if child.map_or(true, |child| tree.has_tag(child, "BR")) {
        ensure_focusable(tree, ctx, root);
        if let Some(block) = tree.first_child(root) {
            *range = Range::contents_of(tree, block);
        }
    } else {
        range.collapse(false);
    }

    Ok(fragment)
}

/// Remove `node`, then any ancestor below `root` left without children
fn remove_emptied(tree: &mut Tree, node: NodeId, root: NodeId) -> EditorResult<()> {
    let mut node = node;
    loop {
        let parent = tree.parent(node);
        tree.remove(node)?;
        match parent {
            Some(parent) if parent != root && tree.child_count(parent) == 0 => node = parent,
            _ => return Ok(()),
        }
    }
}

fn is_blank(tree: &Tree, node: NodeId) -> bool {
    tree.text_content(node).trim().is_empty()
}

/// Insert the children of `fragment` at the range.
///
/// Inline-only content goes in at the caret. Block content splits the tree up to the
/// nearest quote (or the root), leading and trailing inline runs of the fragment join
/// the blocks on either side of the split, and the blocks go in between. Empty blocks
/// left over by the split are pruned and like containers at both seams are merged.
#[instrument(level = "debug", skip(tree, ctx))]
pub fn insert_fragment(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    range: &mut Range,
    fragment: NodeId,
) -> EditorResult<()> {
    check_range(tree, ctx, range)?;
    let root = ctx.root;
    let all_inline = tree
        .children(fragment)
        .iter()
        .all(|&child| ctx.schema.is_inline(tree, child));

    if !range.is_collapsed() {
        let removed = delete_contents(tree, ctx, range)?;
        tree.remove(removed)?;
    }

    move_boundaries_down(tree, range, root);

    if all_inline {
        insert_node_in_range(tree, range, fragment)?;
        tree.remove(fragment)?;
        range.collapse(false);
        return Ok(());
    }

    // 1. Split up to the nearest quote or the root
    let split_point = range.start.node;
    let stop = tree
        .parent(split_point)
        .and_then(|parent| nearest(tree, parent, root, "BLOCKQUOTE", &[]))
        .unwrap_or(root);
    let mut node_after_split = match split(tree, ctx, split_point, range.start.offset, stop)? {
        Some(node) => node,
        None => {
            let block = ctx.create_default_block(tree);
            tree.append_child(stop, block)?;
            block
        }
    };
    let mut node_before_split = match tree.previous_sibling(node_after_split) {
        Some(node) => node,
        None => {
            let block = ctx.create_default_block(tree);
            tree.insert_before(stop, block, Some(node_after_split))?;
            block
        }
    };
    let parent = tree.parent(node_after_split).unwrap_or(stop);
    debug!(before = %node_before_split, after = %node_after_split, "Split for block insertion");

    // 2. Move into the edges of the split and hand them the fragment's inline runs
    let enterable =
        |tree: &Tree, node: NodeId| !is_leaf(tree, node) && tree.is_editable(node, root);

    let mut start_container = node_before_split;
    let mut start_offset = tree.child_count(start_container);
    while let Some(child) = tree
        .last_child(start_container)
        .filter(|&child| tree.is_element(child))
    {
        if tree.has_tag(child, "BR") {
            start_offset = start_offset.saturating_sub(1);
            break;
        }
        if !enterable(tree, child) {
            break;
        }
        start_container = child;
        start_offset = tree.child_count(child);
    }

    let mut end_container = node_after_split;
    let mut end_offset = 0;
    while let Some(child) = tree.first_child(end_container).filter(|&child| {
        tree.is_element(child) && !tree.has_tag(child, "BR") && enterable(tree, child)
    }) {
        end_container = child;
    }

    let start_anchor = tree.child(start_container, start_offset);
    while let Some(child) = tree
        .first_child(fragment)
        .filter(|&child| ctx.schema.is_inline(tree, child))
    {
        tree.insert_before(start_container, child, start_anchor)?;
    }
    while let Some(child) = tree
        .last_child(fragment)
        .filter(|&child| ctx.schema.is_inline(tree, child))
    {
        let first = tree.first_child(end_container);
        tree.insert_before(end_container, child, first)?;
        end_offset += 1;
    }

    // 3. Blocks go between the halves
    tree.insert_before(parent, fragment, Some(node_after_split))?;
    tree.remove(fragment)?;

    // 4. Prune empty blocks left by the split, then merge containers at the seams
    let next = tree.next_sibling(node_before_split).unwrap_or(node_after_split);
    if let Some(block) = previous_block(tree, &ctx.schema, next, root) {
        if is_blank(tree, block) {
            remove_emptied(tree, block, root)?;
        }
    }
    if !tree.is_live(node_before_split) {
        if let Some(previous) = tree.previous_sibling(next) {
            node_before_split = previous;
        }
    }
    if !tree.is_live(start_container) {
        if tree.is_live(node_before_split) {
            start_container = node_before_split;
            start_offset = tree.child_count(node_before_split);
        } else {
            start_container = tree.parent(next).unwrap_or(root);
            start_offset = 0;
        }
    }
    if tree.is_live(next)
        && ctx.schema.is_container(tree, next)
        && tree.is_editable(next, root)
    {
        merge_containers(tree, ctx, next)?;
    }

    let previous = tree.previous_sibling(node_after_split);
    let trailing = if ctx.schema.is_block(tree, node_after_split) {
        Some(node_after_split)
    } else {
        next_block(tree, &ctx.schema, node_after_split, root)
    };
    if let Some(block) = trailing {
        if is_blank(tree, block) {
            remove_emptied(tree, block, root)?;
        }
    }
    if !tree.is_live(node_after_split) {
        if let Some(after) = previous.and_then(|previous| tree.next_sibling(previous)) {
            node_after_split = after;
        }
    }
    if end_offset == 0 || !tree.is_live(end_container) {
        if let Some(previous) = previous.filter(|&previous| tree.is_live(previous)) {
            end_container = previous;
            end_offset = tree.child_count(previous);
        } else {
            end_container = start_container;
            end_offset = start_offset;
        }
    }
    if tree.is_live(node_after_split)
        && ctx.schema.is_container(tree, node_after_split)
        && tree.is_editable(node_after_split, root)
    {
        merge_containers(tree, ctx, node_after_split)?;
    }

    let start_offset = start_offset.min(tree.length(start_container));
    let end_offset = end_offset.min(tree.length(end_container));
    *range = Range::new(
        BoundaryPoint::new(start_container, start_offset),
        BoundaryPoint::new(end_container, end_offset),
    )
    .normalized(tree);
    encapsulate_non_editable(tree, range, root);
    move_boundaries_down(tree, range, root);
    Ok(())
}
