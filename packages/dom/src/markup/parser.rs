//! Tolerant markup parser
//!
//! Builds arena nodes from the token stream. Mismatched end tags close back to the
//! nearest matching open element or are ignored. Elements still open at the end of
//! input are closed implicitly.

use tracing::debug;

use super::entities;
use super::lexer::{lex, Token};
use crate::error::ParseResult;
use crate::tree::{Element, NodeId, Tree};

/// Parse markup into a new fragment owned by `tree`
pub fn parse_fragment(tree: &mut Tree, source: &str) -> ParseResult<NodeId> {
    let fragment = tree.create_fragment();
    parse_into(tree, fragment, source)?;
    Ok(fragment)
}

/// Parse markup and append the result to `parent`
pub fn parse_into(tree: &mut Tree, parent: NodeId, source: &str) -> ParseResult<()> {
    let tokens = lex(source)?;
    let mut open: Vec<NodeId> = vec![parent];
    let mut pending: Option<(Element, Option<String>)> = None;

    for spanned in tokens {
        match spanned.token {
            Token::Text(text) => {
                let top = current(&open, parent);
                append_text(tree, top, &entities::decode(text))?;
            }
            Token::TagOpen(name) => {
                pending = Some((Element::new(name), None));
            }
            Token::AttrName(attr) => {
                if let Some((element, last)) = pending.as_mut() {
                    if let Some(previous) = last.take() {
                        element.set_attr(&previous, "");
                    }
                    *last = Some(attr.to_ascii_lowercase());
                }
            }
            Token::AttrValue(value) => {
                if let Some((element, last)) = pending.as_mut() {
                    if let Some(attr) = last.take() {
                        element.set_attr(&attr, entities::decode(value));
                    }
                }
            }
            Token::TagEnd | Token::TagSelfClose => {
                let Some((mut element, last)) = pending.take() else {
                    continue;
                };
                if let Some(attr) = last {
                    element.set_attr(&attr, "");
                }
                let is_void = element.is_void();
                let node = tree.create_element(element);
                tree.append_child(current(&open, parent), node)?;
                if !is_void && spanned.token == Token::TagEnd {
                    open.push(node);
                }
            }
            Token::TagClose(name) => {
                match open
                    .iter()
                    .rposition(|&node| node != parent && tree.has_tag(node, name))
                {
                    Some(position) => open.truncate(position),
                    None => {
                        debug!(tag = %name, pos = spanned.span.start, "Ignoring unmatched end tag");
                    }
                }
            }
        }
    }

    Ok(())
}

fn current(open: &[NodeId], fallback: NodeId) -> NodeId {
    open.last().copied().unwrap_or(fallback)
}

fn append_text(tree: &mut Tree, parent: NodeId, text: &str) -> ParseResult<()> {
    if let Some(last) = tree.last_child(parent).filter(|&node| tree.is_text(node)) {
        tree.append_text(last, text)?;
    } else {
        let node = tree.create_text(text);
        tree.append_child(parent, node)?;
    }
    Ok(())
}
