//! # Schema / Classifier
//!
//! Pure lookups mapping a node to its [`Classification`] and answering whether a
//! child may sit inside a given parent. Nothing here mutates the tree.
//!
//! ## Design
//!
//! - Elements are identified by their full node name: `TAG` or `TAG.class`
//! - The translation table maps full node names to schema tags (`B` → `strong`,
//!   `BLOCKQUOTE.aside` → `aside`, ...)
//! - The classification table maps schema tags to a [`Classification`]
//! - A handful of structural rules override the tables: the root, paragraphs, list
//!   items, page-break containers and widgets

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use folio_dom::{NodeData, NodeId, Tree};

use crate::config::SchemaConfig;

/// Content classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    /// Holds blocks only
    Containers,
    /// Holds a single paragraph
    BlockWithText,
    /// A block with no editable text of its own
    BlockAtomic,
    Paragraph,
    InlineWithText,
    InlineWithAtomic,
    /// Not described by the schema
    Undefined,
}

impl Classification {
    pub fn is_static(self) -> bool {
        matches!(self, Classification::BlockAtomic | Classification::Containers)
    }
}

const LEAF_TAGS: &[&str] = &["BR", "IMG", "INPUT"];

/// HTML phrasing content. Runs of these are wrapped into a paragraph even when the
/// schema does not know the tag; paragraph repair then unwraps the unknown ones.
const PHRASING_TAGS: &[&str] = &[
    "A", "ABBR", "ACRONYM", "B", "BDI", "BDO", "BR", "CITE", "CODE", "DATA", "DEL", "DFN",
    "EM", "FONT", "I", "IMG", "INPUT", "INS", "KBD", "Q", "RP", "RT", "RUBY", "S", "SAMP",
    "SMALL", "SPAN", "STRIKE", "STRONG", "SUB", "SUP", "U", "VAR", "WBR",
];

/// Compiled lookup tables
#[derive(Debug, Clone)]
pub struct Schema {
    config: SchemaConfig,
    translations: HashMap<String, String>,
    allowed_content: HashMap<String, Classification>,
}

impl Schema {
    pub fn new(config: SchemaConfig) -> Self {
        let translations = create_translation_map(&config);
        let allowed_content = create_allowed_content_map(&config);
        Self {
            config,
            translations,
            allowed_content,
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Schema tag for a full node name
    pub fn translate(&self, full_name: &str) -> Option<&str> {
        self.translations.get(full_name).map(String::as_str)
    }

    /// Schema tag for the node, looked up by full node name
    pub fn schema_tag(&self, tree: &Tree, node: NodeId) -> Option<&str> {
        self.translate(&full_node_name(tree, node))
    }

    pub fn classify(&self, tree: &Tree, node: NodeId, root: NodeId) -> Classification {
        if node == root {
            return if self.config.inline_mode {
                Classification::BlockWithText
            } else {
                Classification::Containers
            };
        }
        if self.is_paragraph(tree, node) {
            return Classification::Paragraph;
        }
        if is_list_item(tree, node) {
            return Classification::BlockWithText;
        }
        if self.is_page_break(tree, node) || self.is_widget(tree, node) {
            return Classification::BlockAtomic;
        }
        self.schema_tag(tree, node)
            .and_then(|tag| self.allowed_content.get(tag).copied())
            .unwrap_or(Classification::Undefined)
    }

    /// Whether inline schema tag `inline` may appear in a block of schema tag `block`.
    /// A block without an entry in the table allows no inline formatting.
    pub fn is_inline_allowed_in(&self, inline: &str, block: &str) -> bool {
        self.config
            .allowed_inline_content_for_blocks
            .get(block)
            .is_some_and(|allowed| allowed.iter().any(|tag| tag == inline))
    }

    pub fn is_block_allowed_in(
        &self,
        tree: &Tree,
        node: NodeId,
        container: NodeId,
        root: NodeId,
    ) -> bool {
        if is_list_item(tree, node) {
            return is_list(tree, container);
        }
        if self.is_paragraph(tree, node) {
            return matches!(
                self.classify(tree, container, root),
                Classification::Containers | Classification::BlockWithText
            );
        }

        let block_tag = match self.schema_tag(tree, node) {
            Some(tag) => tag.to_string(),
            None if self.is_page_break(tree, node) => "hr".to_string(),
            None if self.is_widget(tree, node) => "smwWidget".to_string(),
            None => return false,
        };
        let container_key = if container == root {
            "root".to_string()
        } else {
            self.schema_tag(tree, container)
                .map(str::to_string)
                .unwrap_or_else(|| tree.node_name(container).to_ascii_lowercase())
        };

        self.config
            .allowed_blocks_for_containers
            .get(&container_key)
            .is_some_and(|allowed| allowed.contains(&block_tag))
    }

    // --- Predicates ---

    pub fn is_inline(&self, tree: &Tree, node: NodeId) -> bool {
        match tree.data(node) {
            Some(NodeData::Text { .. }) => true,
            Some(NodeData::Element(element)) => {
                self.config.inline_tags.iter().any(|tag| element.has_tag(tag))
            }
            _ => false,
        }
    }

    /// Inline, or any HTML phrasing element
    pub fn is_phrasing(&self, tree: &Tree, node: NodeId) -> bool {
        self.is_inline(tree, node)
            || tree
                .element(node)
                .is_some_and(|element| PHRASING_TAGS.contains(&element.tag.as_str()))
    }

    pub fn is_block(&self, tree: &Tree, node: NodeId) -> bool {
        match tree.data(node) {
            Some(NodeData::Element(_)) => self.is_paragraph(tree, node),
            Some(NodeData::Fragment) => tree
                .children(node)
                .iter()
                .all(|&child| self.is_inline(tree, child)),
            _ => false,
        }
    }

    pub fn is_container(&self, tree: &Tree, node: NodeId) -> bool {
        (tree.is_element(node) || tree.is_fragment(node))
            && !self.is_inline(tree, node)
            && !self.is_block(tree, node)
    }

    pub fn is_paragraph(&self, tree: &Tree, node: NodeId) -> bool {
        tree.element(node).is_some_and(|element| {
            element.has_tag(&self.config.block_tag)
                && element
                    .class
                    .as_deref()
                    .map_or(true, |class| class == "paragraph")
        })
    }

    pub fn is_blockquote(&self, tree: &Tree, node: NodeId) -> bool {
        let expected = match &self.config.tag_attributes.blockquote {
            Some(attr) => format!("BLOCKQUOTE.{}", attr.class),
            None => "BLOCKQUOTE".to_string(),
        };
        full_node_name(tree, node) == expected
    }

    pub fn is_aside(&self, tree: &Tree, node: NodeId) -> bool {
        full_node_name(tree, node) == format!("BLOCKQUOTE.{}", self.config.tag_attributes.aside.class)
    }

    pub fn is_page_panel(&self, tree: &Tree, node: NodeId) -> bool {
        full_node_name(tree, node)
            == format!("BLOCKQUOTE.{}", self.config.tag_attributes.page_panel.class)
    }

    pub fn is_page_break(&self, tree: &Tree, node: NodeId) -> bool {
        full_node_name(tree, node)
            == format!(
                "{}.{}",
                self.config.block_tag, self.config.tag_attributes.page_break_container.class
            )
    }

    pub fn is_widget(&self, tree: &Tree, node: NodeId) -> bool {
        tree.has_tag(node, &self.config.widget_tag)
    }
}

fn create_translation_map(config: &SchemaConfig) -> HashMap<String, String> {
    let attrs = &config.tag_attributes;
    let blockquote = match &attrs.blockquote {
        Some(attr) => format!("BLOCKQUOTE.{}", attr.class),
        None => "BLOCKQUOTE".to_string(),
    };
    let bulleted = match &attrs.ul {
        Some(attr) => format!("UL.{}", attr.class),
        None => "UL".to_string(),
    };

    let mut translations: HashMap<String, String> = [
        ("B", "strong"),
        ("I", "em"),
        ("SPAN", "span"),
        ("H1", "heading"),
        ("H2", "heading"),
        ("H3", "heading"),
        ("H4", "heading"),
        ("OL", "list"),
        ("A", "link"),
        ("BR", "br"),
    ]
    .into_iter()
    .map(|(html, schema)| (html.to_string(), schema.to_string()))
    .collect();

    translations.insert(config.widget_tag.to_ascii_uppercase(), "smwWidget".to_string());
    translations.insert(blockquote, "blockquote".to_string());
    translations.insert(format!("BLOCKQUOTE.{}", attrs.aside.class), "aside".to_string());
    translations.insert(
        format!("BLOCKQUOTE.{}", attrs.page_panel.class),
        "pagePanel".to_string(),
    );
    translations.insert(bulleted, "list".to_string());
    translations.insert(format!("UL.{}", attrs.no_labels.class), "list".to_string());
    translations.insert(format!("IMG.{}", attrs.page_break.class), "hr".to_string());

    translations.retain(|_, schema_tag| config.allowed_tags.contains(schema_tag));
    translations
}

fn create_allowed_content_map(config: &SchemaConfig) -> HashMap<String, Classification> {
    let mut allowed = HashMap::new();
    for (classification, tags) in &config.classifications {
        for tag in tags {
            if config.allowed_tags.contains(tag) {
                allowed.insert(tag.clone(), *classification);
            }
        }
    }
    allowed
}

/// `TAG` or `TAG.class`; empty for anything but elements
pub fn full_node_name(tree: &Tree, node: NodeId) -> String {
    match tree.element(node) {
        Some(element) => match &element.class {
            Some(class) => format!("{}.{}", element.tag, class),
            None => element.tag.clone(),
        },
        None => String::new(),
    }
}

pub fn is_leaf(tree: &Tree, node: NodeId) -> bool {
    tree.element(node)
        .is_some_and(|element| LEAF_TAGS.contains(&element.tag.as_str()))
}

pub fn is_list(tree: &Tree, node: NodeId) -> bool {
    tree.has_tag(node, "OL") || tree.has_tag(node, "UL")
}

pub fn is_list_item(tree: &Tree, node: NodeId) -> bool {
    tree.has_tag(node, "LI")
}

pub fn is_heading(tree: &Tree, node: NodeId) -> bool {
    tree.element(node).is_some_and(|element| {
        let mut chars = element.tag.chars();
        chars.next() == Some('H') && chars.next().is_some_and(|c| c.is_ascii_digit()) && chars.next().is_none()
    })
}

/// Same node type, name, class and inline style. Leaves are never alike.
pub fn are_alike(tree: &Tree, node: NodeId, other: NodeId) -> bool {
    if is_leaf(tree, node) {
        return false;
    }
    match (tree.data(node), tree.data(other)) {
        (Some(NodeData::Text { .. }), Some(NodeData::Text { .. })) => true,
        (Some(NodeData::Element(a)), Some(NodeData::Element(b))) => {
            a.tag == b.tag && a.class == b.class && a.style() == b.style()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_dom::Element;

    fn setup() -> (Schema, Tree) {
        (Schema::new(SchemaConfig::default()), Tree::new(Element::new("div")))
    }

    #[test]
    fn test_classify_structural_rules() {
        let (schema, mut tree) = setup();
        let root = tree.root();
        let p = tree.create_element(Element::new("p"));
        let li = tree.create_element(Element::new("li"));
        let widget = tree.create_element(Element::new("mywo-content-widget").non_editable());
        let page_break = tree.create_element(Element::new("p").with_class("page-break-container"));

        assert_eq!(schema.classify(&tree, root, root), Classification::Containers);
        assert_eq!(schema.classify(&tree, p, root), Classification::Paragraph);
        assert_eq!(schema.classify(&tree, li, root), Classification::BlockWithText);
        assert_eq!(schema.classify(&tree, widget, root), Classification::BlockAtomic);
        assert_eq!(schema.classify(&tree, page_break, root), Classification::BlockAtomic);
    }

    #[test]
    fn test_classify_through_translation_table() {
        let (schema, mut tree) = setup();
        let root = tree.root();
        let h2 = tree.create_element(Element::new("h2"));
        let aside = tree.create_element(Element::new("blockquote").with_class("aside"));
        let bare_quote = tree.create_element(Element::new("blockquote"));
        let bold = tree.create_element(Element::new("b"));
        let br = tree.create_element(Element::new("br"));
        let div = tree.create_element(Element::new("div"));
        let text = tree.create_text("x");

        assert_eq!(schema.classify(&tree, h2, root), Classification::BlockWithText);
        assert_eq!(schema.classify(&tree, aside, root), Classification::Containers);
        assert_eq!(schema.classify(&tree, bare_quote, root), Classification::Undefined);
        assert_eq!(schema.classify(&tree, bold, root), Classification::InlineWithText);
        assert_eq!(schema.classify(&tree, br, root), Classification::InlineWithAtomic);
        assert_eq!(schema.classify(&tree, div, root), Classification::Undefined);
        assert_eq!(schema.classify(&tree, text, root), Classification::Undefined);
    }

    #[test]
    fn test_inline_mode_root_holds_text() {
        let config = SchemaConfig {
            inline_mode: true,
            ..SchemaConfig::default()
        };
        let schema = Schema::new(config);
        let tree = Tree::new(Element::new("div"));
        assert_eq!(
            schema.classify(&tree, tree.root(), tree.root()),
            Classification::BlockWithText
        );
    }

    #[test]
    fn test_block_allowed_in() {
        let (schema, mut tree) = setup();
        let root = tree.root();
        let ul = tree.create_element(Element::new("ul"));
        let li = tree.create_element(Element::new("li"));
        let p = tree.create_element(Element::new("p"));
        let aside = tree.create_element(Element::new("blockquote").with_class("aside"));
        let panel = tree.create_element(Element::new("blockquote").with_class("page-panel"));
        let h1 = tree.create_element(Element::new("h1"));

        assert!(schema.is_block_allowed_in(&tree, li, ul, root));
        assert!(!schema.is_block_allowed_in(&tree, li, root, root));
        assert!(schema.is_block_allowed_in(&tree, p, root, root));
        assert!(schema.is_block_allowed_in(&tree, p, h1, root));
        assert!(!schema.is_block_allowed_in(&tree, h1, ul, root));
        assert!(schema.is_block_allowed_in(&tree, aside, panel, root));
        assert!(!schema.is_block_allowed_in(&tree, panel, aside, root));
        assert!(schema.is_block_allowed_in(&tree, h1, root, root));
    }

    #[test]
    fn test_inline_allowed_in() {
        let (schema, _) = setup();
        assert!(schema.is_inline_allowed_in("br", "heading"));
        assert!(!schema.is_inline_allowed_in("strong", "heading"));
        assert!(schema.is_inline_allowed_in("link", "list"));
        assert!(schema.is_inline_allowed_in("strong", "aside"));
        assert!(schema.is_inline_allowed_in("em", "pagePanel"));
        assert!(!schema.is_inline_allowed_in("strong", "hr"));
        assert!(!schema.is_inline_allowed_in("strong", "unknown"));
    }

    #[test]
    fn test_alike_ignores_leaves_and_checks_style() {
        let (_, mut tree) = setup();
        let a = tree.create_element(Element::new("b").with_attr("style", "color: red"));
        let b = tree.create_element(Element::new("b").with_attr("style", "color: red"));
        let c = tree.create_element(Element::new("b"));
        let br1 = tree.create_element(Element::new("br"));
        let br2 = tree.create_element(Element::new("br"));
        let t1 = tree.create_text("a");
        let t2 = tree.create_text("b");

        assert!(are_alike(&tree, a, b));
        assert!(!are_alike(&tree, a, c));
        assert!(!are_alike(&tree, br1, br2));
        assert!(are_alike(&tree, t1, t2));
    }

    #[test]
    fn test_predicates() {
        let (schema, mut tree) = setup();
        let p = tree.create_element(Element::new("p").with_class("paragraph"));
        let styled = tree.create_element(Element::new("p").with_class("lead"));
        let h3 = tree.create_element(Element::new("h3"));
        let span = tree.create_element(Element::new("span"));
        let u = tree.create_element(Element::new("u"));

        assert!(schema.is_paragraph(&tree, p));
        assert!(!schema.is_paragraph(&tree, styled));
        assert!(schema.is_block(&tree, p));
        assert!(is_heading(&tree, h3));
        assert!(schema.is_inline(&tree, span));
        assert!(!schema.is_inline(&tree, u));
        assert!(schema.is_phrasing(&tree, u));
        assert!(schema.is_container(&tree, h3));
        assert_eq!(full_node_name(&tree, styled), "P.lead");
    }
}
