//! Integration tests for the node arena and markup codec

use folio_dom::{markup, DomError, Element, Tree};

fn document(source: &str) -> Tree {
    let mut tree = Tree::new(Element::new("div"));
    let root = tree.root();
    markup::parse_into(&mut tree, root, source).unwrap();
    tree
}

#[test]
fn test_stale_ids_never_alias_new_nodes() {
    let mut tree = document("<p>a</p>");
    let root = tree.root();
    let p = tree.first_child(root).unwrap();

    tree.remove(p).unwrap();
    let replacement = tree.create_text("b");

    assert_ne!(p, replacement);
    assert!(!tree.is_live(p));
    assert_eq!(tree.element(p), None);
    assert_eq!(tree.append_child(p, replacement), Err(DomError::StaleNode(p)));
}

#[test]
fn test_moving_a_node_into_its_descendant_is_rejected() {
    let mut tree = document("<blockquote><p>a</p></blockquote>");
    let root = tree.root();
    let quote = tree.first_child(root).unwrap();
    let p = tree.first_child(quote).unwrap();

    assert!(matches!(
        tree.append_child(p, quote),
        Err(DomError::HierarchyCycle { .. })
    ));
    assert_eq!(tree.parent(quote), Some(root));
}

#[test]
fn test_void_elements_refuse_children() {
    let mut tree = document("<p>a<br></p>");
    let root = tree.root();
    let p = tree.first_child(root).unwrap();
    let br = tree.last_child(p).unwrap();
    let text = tree.create_text("x");

    assert_eq!(
        tree.append_child(br, text),
        Err(DomError::VoidElement {
            tag: "BR".to_string()
        })
    );
}

#[test]
fn test_fragment_is_spliced_and_left_empty() {
    let mut tree = document("<p>ad</p>");
    let root = tree.root();
    let p = tree.first_child(root).unwrap();
    let text = tree.first_child(p).unwrap();
    let tail = tree.split_text(text, 1).unwrap();

    let fragment = markup::parse_fragment(&mut tree, "b<i>c</i>").unwrap();
    tree.insert_before(p, fragment, Some(tail)).unwrap();

    assert_eq!(tree.child_count(fragment), 0);
    assert_eq!(markup::serialize_children(&tree, root), "<p>ab<i>c</i>d</p>");
}

#[test]
fn test_take_children_moves_everything() {
    let mut tree = document("<p>a<b>b</b></p>");
    let root = tree.root();
    let p = tree.first_child(root).unwrap();

    let contents = tree.take_children(p).unwrap();

    assert_eq!(tree.child_count(p), 0);
    assert!(tree.is_fragment(contents));
    assert_eq!(tree.text_content(contents), "ab");
}

#[test]
fn test_editability_is_inherited() {
    let tree = document(r#"<div contenteditable="false"><span>x</span></div><p>y</p>"#);
    let root = tree.root();
    let widget = tree.first_child(root).unwrap();
    let span = tree.first_child(widget).unwrap();
    let p = tree.last_child(root).unwrap();

    assert!(!tree.is_editable(span, root));
    assert!(tree.is_editable(p, root));
}

#[test]
fn test_markup_round_trip_is_stable() {
    let sources = [
        r#"<p class="lead" title="a &quot;b&quot;">x &amp; y &lt; z</p>"#,
        r#"<ul class="noLabels"><li><p>one<br></p></li></ul>"#,
        r#"<mywo-content-widget contenteditable="false" data-id="7"></mywo-content-widget>"#,
        r#"<p><img class="page-break" src="x.png"></p>"#,
    ];
    for source in sources {
        let once = markup::serialize_children(&document(source), document(source).root());
        let twice = markup::serialize_children(&document(&once), document(&once).root());
        assert_eq!(once, twice, "unstable for {source}");
    }
}

#[test]
fn test_entities_are_decoded() {
    let tree = document("<p>a&nbsp;b &#65;&#x42;</p>");
    assert_eq!(tree.text_content(tree.root()), "a\u{a0}b AB");
}
