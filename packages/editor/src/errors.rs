//! Error types for the editor

use thiserror::Error;

use folio_dom::NodeId;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] folio_dom::ParseError),

    #[error("Tree error: {0}")]
    Dom(#[from] folio_dom::DomError),

    #[error("Range boundary {node} is not attached to the editor root")]
    DetachedBoundary { node: NodeId },

    #[error("No selection available")]
    NoSelection,

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
