//! Integration tests for editor crate

use folio_dom::markup;
use folio_editor::mutation::delete_contents;
use folio_editor::repair::repair_container;
use folio_editor::split_merge::{merge_with_block, split};
use folio_editor::{
    BoundaryPoint, Editor, EditorContext, Element, MemorySelectionHost, NodeId, Range,
    SchemaConfig, Tree,
};

fn editor(source: &str) -> Editor {
    let mut editor = Editor::new(SchemaConfig::default(), Box::new(MemorySelectionHost::new()));
    editor.set_markup(source).unwrap();
    editor
}

fn texts(tree: &Tree, root: NodeId) -> Vec<NodeId> {
    tree.descendants(root)
        .into_iter()
        .filter(|&node| tree.is_text(node))
        .collect()
}

fn document(source: &str) -> (Tree, EditorContext) {
    let mut tree = Tree::new(Element::new("div"));
    let root = tree.root();
    markup::parse_into(&mut tree, root, source).unwrap();
    let ctx = EditorContext::new(SchemaConfig::default(), root);
    (tree, ctx)
}

fn repaired(source: &str) -> String {
    let (mut tree, mut ctx) = document(source);
    let root = tree.root();
    repair_container(&mut tree, &mut ctx, root);
    markup::serialize_children(&tree, root)
}

#[test]
fn test_repair_is_idempotent_after_edits() {
    let sources = [
        "plain text",
        "<p>a</p><p>b<br>c</p>",
        "<ul><li>one</li>two<li><b>three</b></li></ul>",
        r#"<blockquote class="aside">quoted<p>para</p></blockquote>"#,
        "<h1><b>Title</b></h1><div><div>deep</div></div>",
        "<p><b><i>nested</i></b></p>",
    ];
    for source in sources {
        let once = repaired(source);
        assert_eq!(repaired(&once), once, "repair not idempotent for {source}");
    }
}

#[test]
fn test_unwinding_keeps_visible_text() {
    let source = "<div>alpha<section>beta <span>gamma</span></section></div><article>delta</article>";
    let (mut tree, mut ctx) = document(source);
    let root = tree.root();
    let before = tree.text_content(root);

    repair_container(&mut tree, &mut ctx, root);

    assert_eq!(tree.text_content(root), before);
    assert!(!markup::serialize_children(&tree, root).contains("<div"));
}

#[test]
fn test_deleting_everything_leaves_one_block() {
    let mut editor = editor("<p>one</p><h1>two</h1><ul><li>three</li></ul>");
    let root = editor.root();
    let end = editor.tree().child_count(root);
    editor.set_selection(Range::new(
        BoundaryPoint::new(root, 0),
        BoundaryPoint::new(root, end),
    ));

    assert!(editor.delete_selection().unwrap());

    let tree = editor.tree();
    assert_eq!(tree.child_count(root), 1);
    assert!(editor.context().schema.is_paragraph(tree, tree.first_child(root).unwrap()));
    assert_eq!(tree.text_content(root), "");
}

#[test]
fn test_split_then_merge_round_trip() {
    let (mut tree, mut ctx) = document("<p>abcdef</p>");
    let root = tree.root();
    let block = tree.first_child(root).unwrap();
    let text = tree.first_child(block).unwrap();

    let after = split(&mut tree, &mut ctx, text, 3, root).unwrap().unwrap();
    assert_eq!(tree.child_count(root), 2);

    let mut range = Range::collapsed_at(BoundaryPoint::new(root, 0));
    merge_with_block(&mut tree, &mut ctx, block, after, &mut range).unwrap();

    assert_eq!(tree.child_count(root), 1);
    assert_eq!(tree.text_content(block), "abcdef");
    assert!(range.is_collapsed());
    assert_eq!(range.start.offset, 3);
}

#[test]
fn test_full_containment_implies_partial() {
    let (tree, _) = document("<p>ab<b>cd</b>ef</p><p>gh</p>");
    let root = tree.root();
    let all = texts(&tree, root);
    let ranges = [
        Range::new(BoundaryPoint::new(all[0], 1), BoundaryPoint::new(all[2], 1)),
        Range::new(BoundaryPoint::new(root, 0), BoundaryPoint::new(root, 2)),
        Range::new(BoundaryPoint::new(all[1], 0), BoundaryPoint::new(all[1], 2)),
        Range::collapsed_at(BoundaryPoint::new(all[3], 1)),
    ];

    for range in ranges {
        for node in tree.descendants(root) {
            if range.contains_node(&tree, node, false) {
                assert!(range.contains_node(&tree, node, true), "{range:?} {node}");
            }
        }
    }
}

#[test]
fn test_pasting_div_into_empty_document() {
    let mut editor = editor("");
    assert_eq!(editor.markup(), "<p><br></p>");

    editor.insert_markup("<div>x<span>y</span></div>").unwrap();

    assert_eq!(editor.markup(), "<p>x<span>y</span><br></p>");
    let range = editor.selection().unwrap();
    assert!(range.is_collapsed());
    assert_eq!(editor.tree().text(range.start.node), Some("y"));
}

#[test]
fn test_pasting_inline_markup_into_text() {
    let mut editor = editor("<p>abcd</p>");
    let text = texts(editor.tree(), editor.root())[0];
    editor.set_selection(Range::collapsed_at(BoundaryPoint::new(text, 2)));

    editor.insert_markup("<b>bold</b>").unwrap();

    assert_eq!(editor.markup(), "<p>ab<b>bold</b>cd<br></p>");
    assert!(editor.can_undo());
    editor.undo().unwrap();
    assert_eq!(editor.markup(), "<p>abcd<br></p>");
    editor.redo().unwrap();
    assert_eq!(editor.markup(), "<p>ab<b>bold</b>cd<br></p>");
}

#[test]
fn test_pasting_paragraphs_mid_text_adds_no_blank_line() {
    let mut editor = editor("<p>abcd</p>");
    let text = texts(editor.tree(), editor.root())[0];
    editor.set_selection(Range::collapsed_at(BoundaryPoint::new(text, 2)));

    editor.insert_markup("<p>one</p><p>two</p>").unwrap();

    assert_eq!(
        editor.markup(),
        "<p>ab<br></p><p>one<br></p><p>two<br></p><p>cd<br></p>"
    );
    let range = editor.selection().unwrap();
    assert!(range.is_collapsed());
    assert_eq!(editor.tree().text(range.start.node), Some("two"));
    assert_eq!(range.start.offset, 3);
}

/// `<p>abcd</p>` natively split into "ab" + "cd", caret at "c|d"
fn editor_with_split_text() -> Editor {
    let mut editor = editor("<p>abcd</p>");
    editor.save_undo_state().unwrap();
    let text = texts(editor.tree(), editor.root())[0];
    let tail = editor.tree_mut().split_text(text, 2).unwrap();
    editor.mark_changed().unwrap();
    editor.set_selection(Range::collapsed_at(BoundaryPoint::new(tail, 1)));
    editor
}

#[test]
fn test_paste_after_native_text_split() {
    let mut editor = editor_with_split_text();

    editor.insert_markup("<b>X</b>").unwrap();

    assert_eq!(editor.markup(), "<p>abc<b>X</b>d<br></p>");
    editor.undo().unwrap();
    assert_eq!(editor.markup(), "<p>abcd<br></p>");
}

#[test]
fn test_undo_after_native_text_split() {
    let mut editor = editor_with_split_text();

    assert!(editor.undo().unwrap());

    assert_eq!(editor.markup(), "<p>abcd<br></p>");
    assert!(editor.selection().is_ok());
    assert!(editor.can_redo());
}

#[test]
fn test_backspace_joins_paragraphs() {
    let mut editor = editor("<p>Hello</p><p>World</p>");
    let all = texts(editor.tree(), editor.root());
    editor.set_selection(Range::new(
        BoundaryPoint::new(all[0], 5),
        BoundaryPoint::new(all[1], 0),
    ));

    assert!(editor.delete_selection().unwrap());

    assert_eq!(editor.markup(), "<p>HelloWorld<br></p>");
    let range = editor.selection().unwrap();
    assert!(range.is_collapsed());
    assert_eq!(editor.tree().text(range.start.node), Some("HelloWorld"));
    assert_eq!(range.start.offset, 5);
}

#[test]
fn test_undo_skips_coalesced_keystrokes() {
    let mut editor = editor("<p>abc</p>");

    // Three keystrokes, each checkpointed before the text changes
    for _ in 0..3 {
        editor.save_undo_state().unwrap();
        let text = texts(editor.tree(), editor.root())[0];
        editor.tree_mut().append_text(text, "x").unwrap();
    }
    assert_eq!(editor.history().levels(), 1);
    editor.mark_changed().unwrap();

    // An explicit command
    let text = texts(editor.tree(), editor.root())[0];
    editor.set_selection(Range::collapsed_at(BoundaryPoint::new(text, 6)));
    editor.insert_markup("<b>!</b>").unwrap();
    assert_eq!(editor.markup(), "<p>abcxxx<b>!</b><br></p>");

    editor.undo().unwrap();
    assert_eq!(editor.markup(), "<p>abcxxx<br></p>");

    editor.undo().unwrap();
    assert_eq!(editor.markup(), "<p>abc<br></p>");
    assert!(!editor.can_undo());
    assert!(!editor.undo().unwrap());
}

#[test]
fn test_delete_contents_reports_detached_range() {
    let (mut tree, mut ctx) = document("<p>abc</p>");
    let stray = tree.create_text("stray");
    let mut range = Range::collapsed_at(BoundaryPoint::new(stray, 0));

    assert!(delete_contents(&mut tree, &mut ctx, &mut range).is_err());
    assert_eq!(ctx.diagnostics.len(), 1);
}
