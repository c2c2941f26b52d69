use thiserror::Error;

use crate::NodeId;

pub type DomResult<T> = Result<T, DomError>;
pub type ParseResult<T> = Result<T, ParseError>;

/// Failures of structural tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0} is no longer part of the arena")]
    StaleNode(NodeId),

    #[error("<{tag}> cannot contain children")]
    VoidElement { tag: String },

    #[error("Text node {0} cannot contain children")]
    NotAContainer(NodeId),

    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    #[error("Inserting {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: NodeId, child: NodeId },

    #[error("The root node cannot be removed")]
    RootRemoval,

    #[error("Offset {offset} is out of bounds for node {node} (length {length})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        length: usize,
    },
}

/// Markup lexing/parsing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected character at {pos}")]
    LexerError { pos: usize },

    #[error("Unterminated tag <{tag}> starting at {pos}")]
    UnterminatedTag { pos: usize, tag: String },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ParseError {
    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn unterminated_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnterminatedTag {
            pos,
            tag: tag.into(),
        }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }
}
