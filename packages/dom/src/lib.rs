//! # Folio DOM
//!
//! Arena-backed document tree plus the markup codec used to load and save it.
//!
//! Nodes are addressed by generation-checked [`NodeId`]s. Read accessors are total
//! (stale ids read as absent); structural mutations return [`DomResult`].

pub mod error;
pub mod markup;
pub mod tree;

pub use error::{DomError, DomResult, ParseError, ParseResult};
pub use tree::{char_to_byte, Ancestors, Element, NodeData, NodeId, Tree, VOID_TAGS};
