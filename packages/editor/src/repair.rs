//! # Tree Repair Engine
//!
//! Normalizes any subtree into a schema-valid shape with minimal structural change.
//!
//! ## Design
//!
//! - Runs of inline content inside a container are wrapped into a default block
//!   (and a list item, inside lists)
//! - Blocks the container does not allow are deleted when atomic or blank, otherwise
//!   forced into a default block and unwound to inline content so no text is lost
//! - Paragraph content is reduced to inline content the parent block allows
//! - Every empty position that should take the caret gets a filler
//!
//! Schema violations are never errors. Structural failures are reported through the
//! context's diagnostics and the affected node is skipped.

use tracing::{debug, instrument};

use folio_dom::{markup, DomResult, NodeId, Tree};

use crate::bookmark;
use crate::context::EditorContext;
use crate::diagnostics::Diagnostic;
use crate::schema::{is_leaf, is_list, is_list_item, Classification, Schema};
use crate::walker::{Show, TreeWalker};

/// Zero-width space used as an invisible caret filler
pub const ZWS: char = '\u{200B}';

enum Filler {
    Text(&'static str),
    LineBreak,
}

/// Make `node` able to take the caret. Returns `node`.
///
/// The root gets a default block when empty (or holding only a bare line break).
/// Empty inline elements get a filler text node. Blocks get a trailing line break,
/// or a leading empty text node when the host uses the text fixer.
pub fn ensure_focusable(tree: &mut Tree, ctx: &mut EditorContext, node: NodeId) -> NodeId {
    let original = node;
    let mut node = node;
    let mut filler = None;
    let capabilities = ctx.capabilities();

    if node == ctx.root {
        let first = tree.first_child(node);
        if first.map_or(true, |child| tree.has_tag(child, "BR")) {
            let block = ctx.create_default_block(tree);
            let placed = match first {
                Some(child) => tree
                    .replace_with(child, block)
                    .and_then(|_| tree.remove(child)),
                None => tree.append_child(node, block),
            };
            if let Err(error) = placed {
                ctx.report(Diagnostic::structural(format!("ensure_focusable: {error}")));
                return original;
            }
            node = block;
        }
    }

    if tree.is_text(node) {
        return original;
    }
    if tree.parent(node).is_some() && !tree.is_editable(node, ctx.root) {
        return original;
    }

    if ctx.schema.is_inline(tree, node) {
        let mut child = tree.first_child(node);
        while capabilities.cant_focus_empty_text_nodes {
            let Some(empty) = child.filter(|&c| tree.text(c) == Some("")) else {
                break;
            };
            if tree.remove(empty).is_err() {
                break;
            }
            child = tree.first_child(node);
        }
        if child.is_none() {
            if capabilities.cant_focus_empty_text_nodes {
                ctx.note_filler_added();
                filler = Some(Filler::Text("\u{200B}"));
            } else {
                filler = Some(Filler::Text(""));
            }
        }
    } else if capabilities.use_text_fixer {
        while !tree.is_text(node) && !is_leaf(tree, node) {
            match tree.first_child(node) {
                Some(child) => node = child,
                None => {
                    filler = Some(Filler::Text(""));
                    break;
                }
            }
        }
        if tree.is_text(node) {
            let only_spaces = tree
                .text(node)
                .is_some_and(|data| !data.is_empty() && data.chars().all(|c| c == ' '));
            if only_spaces {
                let _ = tree.set_text(node, "");
            }
        } else if is_leaf(tree, node) {
            if let Some(parent) = tree.parent(node) {
                let empty = tree.create_text("");
                if let Err(error) = tree.insert_before(parent, empty, Some(node)) {
                    let _ = tree.remove(empty);
                    ctx.report(Diagnostic::structural(format!("ensure_focusable: {error}")));
                }
            }
        }
    } else if ctx.schema.is_block(tree, node)
        && last_content_child(tree, node).is_some_and(|last| !tree.has_tag(last, "BR"))
    {
        filler = Some(Filler::LineBreak);
    } else if !has_line_break(tree, node) {
        filler = Some(Filler::LineBreak);
        while let Some(child) = last_element_child(tree, node) {
            if ctx.schema.is_inline(tree, child) {
                break;
            }
            node = child;
        }
    }

    if let Some(filler) = filler {
        let fixer = match filler {
            Filler::Text(data) => tree.create_text(data),
            Filler::LineBreak => tree.create_element(folio_dom::Element::new("BR")),
        };
        if let Err(error) = tree.append_child(node, fixer) {
            let fixer_name = tree.node_name(fixer).to_string();
            let _ = tree.remove(fixer);
            ctx.report(
                Diagnostic::structural(format!("ensure_focusable: {error}")).with_context(format!(
                    "Parent: {}/{} appendChild: {}",
                    tree.node_name(node),
                    markup::serialize_children(tree, node),
                    fixer_name
                )),
            );
        }
    }

    original
}

fn has_line_break(tree: &Tree, node: NodeId) -> bool {
    tree.descendants(node)
        .into_iter()
        .any(|descendant| tree.has_tag(descendant, "BR"))
}

/// Last child that is not a bookmark marker
fn last_content_child(tree: &Tree, node: NodeId) -> Option<NodeId> {
    tree.children(node)
        .iter()
        .rev()
        .copied()
        .find(|&child| !bookmark::is_marker(tree, child))
}

fn last_element_child(tree: &Tree, node: NodeId) -> Option<NodeId> {
    tree.children(node)
        .iter()
        .rev()
        .copied()
        .find(|&child| tree.is_element(child))
}

/// Move every child of `node` to just before it, then remove `node`
pub(crate) fn unwrap(tree: &mut Tree, node: NodeId) -> DomResult<()> {
    if let Some(parent) = tree.parent(node) {
        let contents = tree.take_children(node)?;
        tree.insert_before(parent, contents, Some(node))?;
        tree.remove(contents)?;
    }
    tree.remove(node)
}

/// Repair whatever `node` is: a paragraph against its parent, anything else as a container
pub fn repair(tree: &mut Tree, ctx: &mut EditorContext, node: NodeId) {
    if ctx.schema.is_paragraph(tree, node) {
        let parent = tree.parent(node).unwrap_or(ctx.root);
        repair_paragraph(tree, ctx, node, parent);
    } else {
        repair_container(tree, ctx, node);
    }
}

/// Recursively wrap, unwind and prune the children of `container`
#[instrument(level = "debug", skip(tree, ctx))]
pub fn repair_container(tree: &mut Tree, ctx: &mut EditorContext, container: NodeId) {
    if let Err(error) = fix_container(tree, ctx, container) {
        ctx.report(
            Diagnostic::structural(format!("repair_container: {error}"))
                .with_context(tree.node_name(container).to_string()),
        );
    }
}

/// Reduce a paragraph to the inline content its parent allows, then make it focusable
pub fn repair_paragraph(tree: &mut Tree, ctx: &mut EditorContext, node: NodeId, parent: NodeId) {
    if let Err(error) = fix_paragraph(tree, ctx, node, parent) {
        ctx.report(
            Diagnostic::structural(format!("repair_paragraph: {error}"))
                .with_context(markup::serialize_node(tree, node)),
        );
    }
}

fn new_wrapper(tree: &mut Tree, ctx: &EditorContext) -> NodeId {
    tree.create_element(ctx.default_block_element())
}

/// Wrap `block` into a list item when it goes into a list
fn finalize_wrapper(tree: &mut Tree, block: NodeId, in_list: bool) -> DomResult<NodeId> {
    if in_list {
        let item = tree.create_element(folio_dom::Element::new("LI"));
        tree.append_child(item, block)?;
        Ok(item)
    } else {
        Ok(block)
    }
}

fn fix_container(tree: &mut Tree, ctx: &mut EditorContext, container: NodeId) -> DomResult<()> {
    if !tree.is_editable(container, ctx.root) {
        return Ok(());
    }

    let classification = ctx.classify(tree, container);
    let in_list = is_list(tree, container);
    if classification == Classification::BlockWithText && !in_list {
        single_paragraph(tree, ctx, container)?;
    }

    let mut wrapper: Option<NodeId> = None;
    let mut index = 0;
    while let Some(child) = tree.child(container, index) {
        let is_br = tree.has_tag(child, "BR");

        if !is_br && ctx.schema.is_phrasing(tree, child) {
            let block = *wrapper.get_or_insert_with(|| new_wrapper(tree, ctx));
            tree.append_child(block, child)?;
            continue;
        }

        if is_br || wrapper.is_some() {
            let block = match wrapper.take() {
                Some(block) => block,
                None => new_wrapper(tree, ctx),
            };
            let placed = finalize_wrapper(tree, block, in_list)?;
            tree.insert_before(container, placed, Some(child))?;
            fix_paragraph(tree, ctx, block, container)?;
            index += 1;
            if is_br {
                tree.remove(child)?;
                continue;
            }
        }

        let child_classification = ctx.classify(tree, child);
        if ctx
            .schema
            .is_block_allowed_in(tree, child, container, ctx.root)
        {
            if child_classification != Classification::Paragraph
                && insert_filler_between_incompatible_siblings(tree, ctx, child)?
            {
                index += 1;
            }
            match child_classification {
                Classification::Containers | Classification::BlockWithText => {
                    fix_container(tree, ctx, child)?;
                }
                Classification::Paragraph => fix_paragraph(tree, ctx, child, container)?,
                _ => {}
            }
            index += 1;
        } else if child_classification == Classification::BlockAtomic
            || !(tree.is_element(child) || tree.is_text(child))
            || tree.text_content(child).trim().is_empty()
        {
            debug!(tag = %tree.node_name(child), "Removing disallowed block");
            tree.remove(child)?;
        } else {
            debug!(tag = %tree.node_name(child), "Unwinding disallowed block");
            let block = new_wrapper(tree, ctx);
            let placed = finalize_wrapper(tree, block, in_list)?;
            tree.insert_before(container, placed, Some(child))?;
            tree.append_child(block, child)?;
            fix_paragraph(tree, ctx, block, container)?;
            index += 1;
        }
    }

    if let Some(block) = wrapper {
        let placed = finalize_wrapper(tree, block, in_list)?;
        tree.append_child(container, placed)?;
        fix_paragraph(tree, ctx, block, container)?;
    }

    if classification == Classification::Containers {
        ensure_bottom_line(tree, ctx, container)?;
    }

    Ok(())
}

/// Collapse the content of a text-holding block into its first paragraph
fn single_paragraph(tree: &mut Tree, ctx: &mut EditorContext, node: NodeId) -> DomResult<()> {
    let paragraph = match tree.first_child(node) {
        Some(first) if ctx.schema.is_paragraph(tree, first) => first,
        _ => {
            let block = new_wrapper(tree, ctx);
            tree.insert_child(node, 0, block)?;
            block
        }
    };

    let mut child = tree.next_sibling(paragraph);
    while let Some(current) = child {
        let next = tree.next_sibling(current);
        if ctx.schema.is_inline(tree, current) {
            tree.append_child(paragraph, current)?;
        } else if tree.is_element(current) && tree.is_editable(current, ctx.root) {
            let contents = tree.take_children(current)?;
            tree.remove(current)?;
            tree.append_child(paragraph, contents)?;
            tree.remove(contents)?;
        }
        child = next;
    }
    Ok(())
}

fn fix_paragraph(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    node: NodeId,
    parent: NodeId,
) -> DomResult<()> {
    // List items are checked against their list
    let parent = if is_list_item(tree, parent) {
        tree.parent(parent).unwrap_or(parent)
    } else {
        parent
    };
    let block_tag = ctx.schema.schema_tag(tree, parent).map(str::to_string);

    fix_inlines(tree, ctx, node, block_tag.as_deref(), true)?;
    ensure_focusable(tree, ctx, node);
    Ok(())
}

fn fix_inlines(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    node: NodeId,
    block_tag: Option<&str>,
    first_cascading: bool,
) -> DomResult<()> {
    let mut child = tree.first_child(node);

    while let Some(mut current) = child {
        let mut detach = false;

        if tree.is_element(current) {
            let is_first = tree.first_child(node) == Some(current);
            if bookmark::is_marker(tree, current) || !tree.is_editable(current, ctx.root) {
                child = tree.next_sibling(current);
                continue;
            }

            let tag = tree.node_name(current).to_string();
            let inline_tag = ctx.schema.translate(&tag).map(str::to_string);
            let allowed = match (&inline_tag, block_tag) {
                (None, _) => false,
                (Some(_), _) if !ctx.schema.is_inline(tree, current) => false,
                (Some(inline), Some(block)) => ctx.schema.is_inline_allowed_in(inline, block),
                (Some(_), None) => true,
            };

            if !allowed {
                if !is_leaf(tree, current) {
                    let contents = tree.take_children(current)?;
                    let after = tree.next_sibling(current);
                    tree.insert_before(node, contents, after)?;
                    tree.remove(contents)?;
                }
                detach = true;
            } else if !is_leaf(tree, current) {
                // Nested inlines of the same tag are redundant
                let nested: Vec<NodeId> = tree
                    .descendants(current)
                    .into_iter()
                    .filter(|&descendant| tree.has_tag(descendant, &tag))
                    .collect();
                for same in nested {
                    unwrap(tree, same)?;
                }
                fix_inlines(tree, ctx, current, block_tag, first_cascading && is_first)?;
            } else if first_cascading && is_first && tag == "BR" {
                // A paragraph never starts with a line break
                detach = true;
            }
        } else if let Some(data) = tree.text(current).map(str::to_owned) {
            if let Some(previous) = tree.previous_sibling(current).filter(|&p| tree.is_text(p)) {
                tree.append_text(previous, &data)?;
                tree.remove(current)?;
                current = previous;
            }
        }

        child = tree.next_sibling(current);
        if detach {
            tree.remove(current)?;
        }
    }
    Ok(())
}

/// Put a default block between two adjacent static blocks (or a static block that is
/// the first child of a static parent). Returns whether a block was inserted.
pub fn insert_filler_between_incompatible_siblings(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    node: NodeId,
) -> DomResult<bool> {
    let classification = ctx.classify(tree, node);
    let relevant = classification.is_static()
        || ctx.schema.is_blockquote(tree, node)
        || is_list(tree, node);
    if !relevant {
        return Ok(false);
    }

    let Some(parent) = tree.parent(node) else {
        return Ok(false);
    };
    let previous = tree.previous_sibling(node).unwrap_or(parent);
    if !ctx.classify(tree, previous).is_static() {
        return Ok(false);
    }

    let block = ctx.create_default_block(tree);
    tree.insert_before(parent, block, Some(node))?;
    Ok(true)
}

/// Append a default block unless the container already ends with one.
/// Lists hold items only, so an empty list gets an item wrapping the block instead.
pub fn ensure_bottom_line(
    tree: &mut Tree,
    ctx: &mut EditorContext,
    container: NodeId,
) -> DomResult<()> {
    if is_list(tree, container) {
        if tree.child_count(container) == 0 {
            let block = ctx.create_default_block(tree);
            let item = finalize_wrapper(tree, block, true)?;
            tree.append_child(container, item)?;
        }
        return Ok(());
    }

    let block_tag = ctx.config().block_tag.clone();
    let ends_with_block = last_element_child(tree, container).is_some_and(|last| {
        tree.has_tag(last, &block_tag) && ctx.schema.is_block(tree, last)
    });
    if !ends_with_block {
        let block = ctx.create_default_block(tree);
        tree.append_child(container, block)?;
    }
    Ok(())
}

/// Strip zero-width fillers under `root`. Text nodes holding nothing but a filler are
/// removed along with any inline ancestors left empty.
pub fn remove_fillers(tree: &mut Tree, ctx: &mut EditorContext, root: NodeId) {
    if !ctx.has_fillers() {
        return;
    }

    let texts: Vec<NodeId> = {
        let mut walker = TreeWalker::new(tree, root, Show::Text, |_: &Tree, _| true);
        std::iter::from_fn(|| walker.next_node()).collect()
    };

    for text in texts {
        let Some(data) = tree.text(text).map(str::to_owned) else {
            continue;
        };
        if !data.contains(ZWS) {
            continue;
        }
        if data.chars().all(|c| c == ZWS) {
            let mut node = text;
            loop {
                let Some(parent) = tree.parent(node) else {
                    break;
                };
                if tree.remove(node).is_err() {
                    break;
                }
                node = parent;
                if node == root || !ctx.schema.is_inline(tree, node) || tree.length(node) > 0 {
                    break;
                }
            }
        } else {
            let _ = tree.set_text(text, data.replace(ZWS, ""));
        }
    }

    ctx.clear_fillers_flag();
}

/// Drop empty text nodes and inline elements left with no children, bottom-up
pub fn remove_empty_inlines(tree: &mut Tree, schema: &Schema, node: NodeId) -> DomResult<()> {
    let children = tree.children(node).to_vec();
    for child in children.into_iter().rev() {
        if tree.is_element(child) && !is_leaf(tree, child) {
            remove_empty_inlines(tree, schema, child)?;
            if schema.is_inline(tree, child) && tree.child_count(child) == 0 {
                tree.remove(child)?;
            }
        } else if tree.text(child) == Some("") {
            tree.remove(child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostCapabilities, SchemaConfig};
    use folio_dom::Element;

    fn setup(source: &str) -> (Tree, EditorContext) {
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        markup::parse_into(&mut tree, root, source).unwrap();
        let ctx = EditorContext::new(SchemaConfig::default(), root);
        (tree, ctx)
    }

    fn repaired(source: &str) -> String {
        let (mut tree, mut ctx) = setup(source);
        let root = tree.root();
        repair_container(&mut tree, &mut ctx, root);
        markup::serialize_children(&tree, root)
    }

    #[test]
    fn test_inline_runs_are_wrapped() {
        assert_eq!(repaired("hello <b>world</b>"), "<p>hello <b>world</b><br></p>");
    }

    #[test]
    fn test_line_breaks_split_runs_into_paragraphs() {
        assert_eq!(repaired("one<br>two"), "<p>one<br></p><p>two<br></p>");
    }

    #[test]
    fn test_empty_root_gets_default_block() {
        assert_eq!(repaired(""), "<p><br></p>");
    }

    #[test]
    fn test_disallowed_block_is_unwound_to_inline() {
        assert_eq!(
            repaired("<div>x<span>y</span></div>"),
            "<p>x<span>y</span><br></p>"
        );
    }

    #[test]
    fn test_nested_same_inlines_are_flattened() {
        assert_eq!(repaired("<p><b>a<b>b</b></b></p>"), "<p><b>ab</b><br></p>");
    }

    #[test]
    fn test_unknown_inline_is_unwrapped() {
        assert_eq!(repaired("a<u>b</u>c"), "<p>abc<br></p>");
    }

    #[test]
    fn test_heading_restricts_inline_content() {
        assert_eq!(
            repaired("<h1><b>Title</b></h1><p>x</p>"),
            "<h1><p>Title<br></p></h1><p>x<br></p>"
        );
    }

    #[test]
    fn test_aside_keeps_inline_formatting() {
        let output = repaired(r#"<blockquote class="aside"><p><b>x</b></p></blockquote>"#);
        assert!(output.contains("<p><b>x</b><br></p>"), "{output}");
    }

    #[test]
    fn test_block_without_inline_entry_strips_formatting() {
        let mut config = SchemaConfig::default();
        config.allowed_inline_content_for_blocks.remove("aside");
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        markup::parse_into(
            &mut tree,
            root,
            r#"<blockquote class="aside"><p><b>x</b></p></blockquote>"#,
        )
        .unwrap();
        let mut ctx = EditorContext::new(config, root);

        repair_container(&mut tree, &mut ctx, root);

        let output = markup::serialize_children(&tree, root);
        assert!(output.contains(r#"<blockquote class="aside"><p>x<br></p>"#), "{output}");
        assert!(!output.contains("<b>"), "{output}");
    }

    #[test]
    fn test_trailing_markers_do_not_hide_line_break() {
        let (mut tree, mut ctx) = setup(&format!(
            r#"<p>two<br><input id="{}" type="hidden"><input id="{}" type="hidden"></p>"#,
            bookmark::START_MARKER_ID,
            bookmark::END_MARKER_ID
        ));
        let root = tree.root();
        let p = tree.first_child(root).unwrap();

        ensure_focusable(&mut tree, &mut ctx, p);

        let breaks = tree
            .children(p)
            .iter()
            .filter(|&&child| tree.has_tag(child, "BR"))
            .count();
        assert_eq!(breaks, 1);
    }

    #[test]
    fn test_list_items_wrap_runs() {
        assert_eq!(
            repaired("<p>a</p><ul><li>one</li>two</ul>"),
            "<p>a<br></p><ul><li><p>one<br></p></li><li><p>two<br></p></li></ul><p><br></p>"
        );
    }

    #[test]
    fn test_disallowed_container_is_unwound() {
        assert_eq!(
            repaired(r#"<blockquote class="aside"><p>a</p><blockquote class="page-panel"><p>x</p></blockquote></blockquote>"#),
            r#"<p><br></p><blockquote class="aside"><p>a<br></p><p>x<br></p></blockquote><p><br></p>"#
        );
    }

    #[test]
    fn test_atomic_disallowed_block_is_removed() {
        assert_eq!(
            repaired(r#"<ul><li>a</li><mywo-content-widget contenteditable="false"></mywo-content-widget></ul>"#),
            "<p><br></p><ul><li><p>a<br></p></li></ul><p><br></p>"
        );
    }

    #[test]
    fn test_empty_list_keeps_one_item() {
        assert_eq!(
            repaired("<p>a</p><ul></ul>"),
            "<p>a<br></p><ul><li><p><br></p></li></ul><p><br></p>"
        );
    }

    #[test]
    fn test_blank_disallowed_block_is_removed() {
        assert_eq!(repaired("<p>a</p><div>  </div>"), "<p>a<br></p>");
    }

    #[test]
    fn test_static_siblings_get_spacer() {
        let out = repaired(
            r#"<p>a</p><mywo-content-widget contenteditable="false"></mywo-content-widget><mywo-content-widget contenteditable="false"></mywo-content-widget><p>b</p>"#,
        );
        assert_eq!(
            out,
            r#"<p>a<br></p><mywo-content-widget contenteditable="false"></mywo-content-widget><p><br></p><mywo-content-widget contenteditable="false"></mywo-content-widget><p>b<br></p>"#
        );
    }

    #[test]
    fn test_paragraph_does_not_start_with_line_break() {
        assert_eq!(repaired("<p><br>a</p>"), "<p>a<br></p>");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let sources = [
            "hello <b>world</b>",
            "<div>x<span>y</span></div>",
            "<ul><li>one</li>two</ul><h2>t</h2>",
            r#"<blockquote class="aside">text<p>a</p></blockquote>"#,
            "<p></p><p><i><i>deep</i></i></p>",
        ];
        for source in sources {
            let once = repaired(source);
            assert_eq!(repaired(&once), once, "not idempotent for {source}");
        }
    }

    #[test]
    fn test_unwind_keeps_visible_text() {
        let source = "<div><section>Alpha <em>beta</em></section><article>gamma</article></div>";
        let (mut tree, mut ctx) = setup(source);
        let root = tree.root();
        let before = tree.text_content(root);

        repair_container(&mut tree, &mut ctx, root);

        assert_eq!(tree.text_content(root), before);
    }

    #[test]
    fn test_empty_inline_gets_zero_width_filler() {
        let (mut tree, mut ctx) = setup("");
        let b = tree.create_element(Element::new("b"));

        ensure_focusable(&mut tree, &mut ctx, b);

        assert_eq!(tree.text(tree.first_child(b).unwrap()), Some("\u{200B}"));
        assert!(ctx.has_fillers());
    }

    #[test]
    fn test_text_fixer_policy_uses_empty_text() {
        let mut config = SchemaConfig::default();
        config.capabilities = HostCapabilities {
            cant_focus_empty_text_nodes: false,
            use_text_fixer: true,
        };
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        let mut ctx = EditorContext::new(config, root);
        let p = tree.create_element(Element::new("p"));

        ensure_focusable(&mut tree, &mut ctx, p);

        assert_eq!(tree.child_count(p), 1);
        assert_eq!(tree.text(tree.first_child(p).unwrap()), Some(""));
    }

    #[test]
    fn test_filler_into_void_element_is_reported() {
        let (mut tree, mut ctx) = setup("");
        let root = tree.root();
        let img = tree.create_element(Element::new("img"));
        tree.append_child(root, img).unwrap();

        ensure_focusable(&mut tree, &mut ctx, img);

        assert_eq!(tree.child_count(img), 0);
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn test_remove_empty_inlines() {
        let (mut tree, ctx) = setup("<p><b><i></i></b>a<span></span><br></p>");
        let root = tree.root();
        let empty = tree.create_text("");
        let p = tree.first_child(root).unwrap();
        tree.append_child(p, empty).unwrap();

        remove_empty_inlines(&mut tree, &ctx.schema, root).unwrap();

        assert_eq!(markup::serialize_children(&tree, root), "<p>a<br></p>");
    }

    #[test]
    fn test_remove_fillers_drops_empty_inlines() {
        let (mut tree, mut ctx) = setup("<p>a<b></b></p>");
        let root = tree.root();
        let p = tree.first_child(root).unwrap();
        let b = tree.child(p, 1).unwrap();
        ensure_focusable(&mut tree, &mut ctx, b);
        let t = tree.create_text("x\u{200B}y");
        tree.append_child(p, t).unwrap();

        remove_fillers(&mut tree, &mut ctx, root);

        assert_eq!(markup::serialize_children(&tree, root), "<p>axy</p>");
        assert!(!ctx.has_fillers());
    }
}
