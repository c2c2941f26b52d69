//! # Markup Codec
//!
//! Reads and writes the HTML subset the editor exchanges with its host.
//!
//! ## Example
//!
//! ```
//! use folio_dom::{markup, Element, Tree};
//!
//! let mut tree = Tree::new(Element::new("div"));
//! let root = tree.root();
//! markup::parse_into(&mut tree, root, "<p>Hello <b>World</b></p>").unwrap();
//! assert_eq!(markup::serialize_children(&tree, root), "<p>Hello <b>World</b></p>");
//! ```

pub mod entities;
pub mod lexer;
mod parser;
mod serializer;

pub use parser::{parse_fragment, parse_into};
pub use serializer::{serialize_children, serialize_node};
