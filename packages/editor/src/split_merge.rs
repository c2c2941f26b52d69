//! # Split / Merge Primitives
//!
//! Structural splitting of a subtree at a boundary and the inverse merges. Merges keep
//! a tracked [`Range`] valid while nodes disappear underneath it.

use tracing::debug;

use folio_dom::{DomResult, NodeId, Tree};

use crate::context::EditorContext;
use crate::range::{BoundaryPoint, Range};
use crate::repair::{self, ensure_focusable};
use crate::schema::{are_alike, is_leaf, is_list, is_list_item, Schema};
use crate::walker::nearest;

/// Split `node` at `offset` and every ancestor up to (not including) `stop`.
///
/// Right-hand content moves into shallow clones inserted after each original. Returns
/// the first node on the right of the split, as a child of `stop`, or `None` when the
/// split point is at the end of `stop`.
pub fn split(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    node: NodeId,
    offset: usize,
    stop: NodeId,
) -> DomResult<Option<NodeId>> {
    if tree.is_text(node) {
        let tail = tree.split_text(node, offset)?;
        if node == stop {
            return Ok(Some(tail));
        }
        return match tree.parent(node) {
            Some(parent) => split_before(tree, ctx, parent, Some(tail), stop),
            None => Ok(Some(tail)),
        };
    }
    let child = tree.child(node, offset);
    split_before(tree, ctx, node, child, stop)
}

fn split_before(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    node: NodeId,
    child: Option<NodeId>,
    stop: NodeId,
) -> DomResult<Option<NodeId>> {
    if node == stop {
        return Ok(child);
    }
    let Some(parent) = tree.parent(node) else {
        return Ok(child);
    };

    let clone = tree.shallow_clone(node)?;
    let mut next = child;
    while let Some(current) = next {
        next = tree.next_sibling(current);
        tree.append_child(clone, current)?;
    }

    // Keep list numbering going inside quotes
    if tree.has_tag(node, "OL") && nearest(tree, node, ctx.root, "BLOCKQUOTE", &[]).is_some() {
        let start = tree
            .element(node)
            .and_then(|element| element.attr("start"))
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(1);
        let retained = tree.child_count(node);
        if let Some(element) = tree.element_mut(clone) {
            element.set_attr("start", (start + retained).to_string());
        }
    }

    // Either half may have been left empty
    ensure_focusable(tree, ctx, node);
    ensure_focusable(tree, ctx, clone);

    let after = tree.next_sibling(node);
    tree.insert_before(parent, clone, after)?;

    split_before(tree, ctx, parent, Some(clone), stop)
}

/// Merge adjacent alike inline runs under `node` (or under the parent of a text node),
/// keeping `range` pointing at the same content.
pub fn merge_inlines(
    tree: &mut Tree,
    schema: &Schema,
    node: NodeId,
    range: &mut Range,
) -> DomResult<()> {
    let node = if tree.is_text(node) {
        match tree.parent(node) {
            Some(parent) => parent,
            None => return Ok(()),
        }
    } else {
        node
    };
    if !tree.is_element(node) {
        return Ok(());
    }

    let mut tracked = *range;
    merge_inline_children(tree, schema, node, &mut tracked)?;
    range.set_start(tree, tracked.start);
    range.set_end(tree, tracked.end);
    Ok(())
}

fn merge_inline_children(
    tree: &mut Tree,
    schema: &Schema,
    node: NodeId,
    tracked: &mut Range,
) -> DomResult<()> {
    if !tree.is_element(node) {
        return Ok(());
    }

    let mut pending: Vec<NodeId> = Vec::new();
    let mut index = tree.child_count(node);
    while index > 0 {
        index -= 1;
        let Some(child) = tree.child(node, index) else {
            continue;
        };
        let previous = index
            .checked_sub(1)
            .and_then(|i| tree.child(node, i))
            .filter(|&previous| {
                schema.is_inline(tree, child)
                    && are_alike(tree, child, previous)
                    && !is_leaf(tree, child)
            });

        if let Some(previous) = previous {
            let previous_length = tree.length(previous);
            for point in [&mut tracked.start, &mut tracked.end] {
                if point.node == child {
                    point.node = previous;
                    point.offset += previous_length;
                }
                if point.node == node {
                    if point.offset > index {
                        point.offset -= 1;
                    } else if point.offset == index {
                        *point = BoundaryPoint::new(previous, previous_length);
                    }
                }
            }

            if let Some(data) = tree.text(child).map(str::to_owned) {
                tree.append_text(previous, &data)?;
            } else {
                pending.push(tree.take_children(child)?);
            }
            tree.remove(child)?;
        } else if tree.is_element(child) {
            while let Some(contents) = pending.pop() {
                tree.append_child(child, contents)?;
                tree.remove(contents)?;
            }
            merge_inline_children(tree, schema, child, tracked)?;
        }
    }

    for contents in pending {
        tree.remove(contents)?;
    }
    Ok(())
}

/// Join `next` onto the end of `block` and collapse `range` at the seam.
///
/// The chain of single-child ancestors holding `next` is removed with it.
pub fn merge_with_block(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    block: NodeId,
    next: NodeId,
    range: &mut Range,
) -> DomResult<()> {
    let mut container = next;
    while let Some(parent) = tree.parent(container) {
        if parent == ctx.root || tree.child_count(parent) != 1 {
            break;
        }
        container = parent;
    }
    tree.detach(container)?;

    tree.normalize(block)?;
    let mut offset = tree.child_count(block);

    // Drop the line break filler
    if let Some(last) = tree.last_child(block).filter(|&last| tree.has_tag(last, "BR")) {
        tree.remove(last)?;
        offset -= 1;
    }

    let mut tracked = Range::collapsed_at(BoundaryPoint::new(block, offset));
    let contents = tree.take_children(next)?;
    tree.append_child(block, contents)?;
    tree.remove(contents)?;
    tree.remove(container)?;

    merge_inline_children(tree, &ctx.schema, block, &mut tracked)?;

    debug!(block = %block, offset = tracked.start.offset, "Merged blocks");
    *range = Range::collapsed_at(tracked.start);
    Ok(())
}

/// Merge `node` into its previous sibling when both are alike containers, then carry
/// on with the first children. List items only merge when they hold nothing but a
/// nested list. Nothing whose tag starts with `H` merges (headings, `HR`, `HEADER`).
pub fn merge_containers(tree: &mut Tree, ctx: &mut EditorContext, node: NodeId) -> DomResult<()> {
    let previous = tree.previous_sibling(node);
    let first = tree.first_child(node);
    let is_item = is_list_item(tree, node);

    let h_tag = tree
        .element(node)
        .is_some_and(|element| element.tag.starts_with('H'));
    if (is_item && !first.is_some_and(|first| is_list(tree, first))) || h_tag {
        return Ok(());
    }

    match previous.filter(|&previous| are_alike(tree, previous, node)) {
        Some(previous) => {
            if !ctx.schema.is_container(tree, previous) {
                if !is_item {
                    return Ok(());
                }
                let block = tree.create_element(ctx.default_block_element());
                let contents = tree.take_children(previous)?;
                tree.append_child(block, contents)?;
                tree.remove(contents)?;
                tree.append_child(previous, block)?;
            }

            tree.detach(node)?;
            let needs_fix = !ctx.schema.is_container(tree, node);
            let contents = tree.take_children(node)?;
            tree.append_child(previous, contents)?;
            tree.remove(contents)?;
            tree.remove(node)?;

            debug!(into = %previous, "Merged containers");
            if needs_fix {
                repair::repair_container(tree, ctx, previous);
            }
            if let Some(first) = first.filter(|&first| tree.is_live(first)) {
                merge_containers(tree, ctx, first)?;
            }
        }
        None if is_item => {
            let block = tree.create_element(ctx.default_block_element());
            tree.insert_before(node, block, first)?;
            ensure_focusable(tree, ctx, block);
        }
        None => {}
    }
    Ok(())
}
