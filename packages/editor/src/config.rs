//! Schema configuration
//!
//! The injected description of the document schema: the default block, the class
//! names that distinguish quote/list variants, the classification table and the two
//! nesting tables. Loaded from camelCase JSON; [`SchemaConfig::default`] is a complete
//! working schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::EditorResult;
use crate::schema::Classification;

/// Schema configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaConfig {
    /// Tag of the default paragraph block
    pub block_tag: String,

    /// Attributes stamped onto every default block
    pub block_attributes: BTreeMap<String, String>,

    /// Class names of the tag variants
    pub tag_attributes: TagAttributes,

    /// Tag of embedded (non-editable) widgets
    pub widget_tag: String,

    /// Schema tags enabled for this editor. Translations to other tags are dropped.
    pub allowed_tags: Vec<String>,

    /// Node names treated as inline content when wrapping runs
    pub inline_tags: Vec<String>,

    /// Classification of every schema tag
    pub classifications: BTreeMap<Classification, Vec<String>>,

    /// Which block tags each container accepts. The document root is keyed `root`.
    pub allowed_blocks_for_containers: BTreeMap<String, Vec<String>>,

    /// Which inline tags each block accepts. Blocks without an entry accept any inline.
    pub allowed_inline_content_for_blocks: BTreeMap<String, Vec<String>>,

    /// Single-line mode: the root holds exactly one paragraph
    pub inline_mode: bool,

    pub capabilities: HostCapabilities,
}

/// Class attribute template for a tag variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttribute {
    pub class: String,
}

impl ClassAttribute {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagAttributes {
    pub blockquote: Option<ClassAttribute>,
    pub aside: ClassAttribute,
    pub page_panel: ClassAttribute,
    pub ul: Option<ClassAttribute>,
    pub no_labels: ClassAttribute,
    /// Class of the `IMG` page-break marker
    pub page_break: ClassAttribute,
    /// Class of the paragraph that wraps a page break
    pub page_break_container: ClassAttribute,
}

impl Default for TagAttributes {
    fn default() -> Self {
        Self {
            blockquote: Some(ClassAttribute::new("blockquote")),
            aside: ClassAttribute::new("aside"),
            page_panel: ClassAttribute::new("page-panel"),
            ul: None,
            no_labels: ClassAttribute::new("noLabels"),
            page_break: ClassAttribute::new("page-break"),
            page_break_container: ClassAttribute::new("page-break-container"),
        }
    }
}

/// What the host editing surface can and cannot do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostCapabilities {
    /// Empty inline elements need a zero-width filler character to take the caret
    pub cant_focus_empty_text_nodes: bool,
    /// Blocks are kept focusable with an empty text node instead of a trailing `BR`
    pub use_text_fixer: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            cant_focus_empty_text_nodes: true,
            use_text_fixer: false,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let classifications = BTreeMap::from([
            (
                Classification::Containers,
                strings(&["list", "aside", "pagePanel"]),
            ),
            (
                Classification::BlockWithText,
                strings(&["heading", "blockquote"]),
            ),
            (Classification::BlockAtomic, strings(&["hr", "smwWidget"])),
            (
                Classification::InlineWithText,
                strings(&["strong", "em", "link", "span"]),
            ),
            (Classification::InlineWithAtomic, strings(&["br"])),
        ]);

        let all_blocks = [
            "heading",
            "list",
            "blockquote",
            "aside",
            "pagePanel",
            "hr",
            "smwWidget",
        ];
        let allowed_blocks_for_containers = BTreeMap::from([
            ("root".to_string(), strings(&all_blocks)),
            (
                "aside".to_string(),
                strings(&["heading", "list", "blockquote", "hr", "smwWidget"]),
            ),
            (
                "pagePanel".to_string(),
                strings(&["heading", "list", "blockquote", "aside", "hr", "smwWidget"]),
            ),
        ]);

        let rich_inline = strings(&["strong", "em", "link", "span", "br"]);
        let allowed_inline_content_for_blocks = BTreeMap::from([
            ("heading".to_string(), strings(&["br"])),
            ("blockquote".to_string(), rich_inline.clone()),
            ("aside".to_string(), rich_inline.clone()),
            ("pagePanel".to_string(), rich_inline.clone()),
            ("list".to_string(), rich_inline),
        ]);

        Self {
            block_tag: "P".to_string(),
            block_attributes: BTreeMap::new(),
            tag_attributes: TagAttributes::default(),
            widget_tag: "MYWO-CONTENT-WIDGET".to_string(),
            allowed_tags: strings(&[
                "strong",
                "em",
                "link",
                "span",
                "br",
                "heading",
                "list",
                "blockquote",
                "aside",
                "pagePanel",
                "hr",
                "smwWidget",
            ]),
            inline_tags: strings(&["A", "BR", "B", "I", "STRONG", "EM", "INPUT", "SPAN"]),
            classifications,
            allowed_blocks_for_containers,
            allowed_inline_content_for_blocks,
            inline_mode: false,
            capabilities: HostCapabilities::default(),
        }
    }
}

impl SchemaConfig {
    /// Parse a JSON config. Missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let mut config: SchemaConfig = serde_json::from_str(json)?;
        config.block_tag = config.block_tag.to_ascii_uppercase();
        config.widget_tag = config.widget_tag.to_ascii_uppercase();
        Ok(config)
    }

    /// Load a JSON config from disk
    pub fn load(path: impl AsRef<Path>) -> EditorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
