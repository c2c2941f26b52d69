//! Markup serialization
//!
//! Output is deterministic: lower-case tag names, `class` first, remaining attributes
//! in name order, `contenteditable="false"` last for opaque elements.

use super::entities;
use crate::tree::{Element, NodeData, NodeId, Tree};

/// Serialize a node and its subtree
pub fn serialize_node(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

/// Serialize only the children of a node
pub fn serialize_children(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &Tree, id: NodeId, out: &mut String) {
    match tree.data(id) {
        Some(NodeData::Text { data }) => out.push_str(&entities::escape_text(data)),
        Some(NodeData::Element(element)) => {
            write_open_tag(element, out);
            if element.is_void() {
                return;
            }
            for &child in tree.children(id) {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag.to_ascii_lowercase());
            out.push('>');
        }
        Some(NodeData::Fragment) => {
            for &child in tree.children(id) {
                write_node(tree, child, out);
            }
        }
        None => {}
    }
}

fn write_open_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag.to_ascii_lowercase());
    if let Some(class) = &element.class {
        write_attr(out, "class", class);
    }
    for (name, value) in &element.attributes {
        write_attr(out, name, value);
    }
    if !element.editable {
        write_attr(out, "contenteditable", "false");
    }
    out.push('>');
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&entities::escape_attr(value));
    out.push('"');
}
