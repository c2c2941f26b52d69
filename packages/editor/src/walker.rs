//! # Tree Walking
//!
//! Document-order traversal that treats non-editable elements as opaque: the walker
//! can land on one but never descends into it.
//!
//! A walker borrows the tree immutably and is created fresh for every traversal.

use folio_dom::{NodeId, Tree};

use crate::schema::Schema;

/// Which node types a walker reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    Elements,
    Text,
    All,
}

impl Show {
    fn accepts(self, tree: &Tree, node: NodeId) -> bool {
        match self {
            Show::Elements => tree.is_element(node),
            Show::Text => tree.is_text(node),
            Show::All => tree.is_element(node) || tree.is_text(node),
        }
    }
}

pub struct TreeWalker<'a, F> {
    tree: &'a Tree,
    root: NodeId,
    current: NodeId,
    show: Show,
    filter: F,
}

fn is_opaque(tree: &Tree, node: NodeId) -> bool {
    tree.element(node).is_some_and(|element| !element.editable)
}

impl<'a, F> TreeWalker<'a, F>
where
    F: Fn(&Tree, NodeId) -> bool,
{
    pub fn new(tree: &'a Tree, root: NodeId, show: Show, filter: F) -> Self {
        Self {
            tree,
            root,
            current: root,
            show,
            filter,
        }
    }

    /// Start walking from `node` instead of the root
    pub fn starting_at(mut self, node: NodeId) -> Self {
        self.current = node;
        self
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    fn matches(&self, node: NodeId) -> bool {
        self.show.accepts(self.tree, node) && (self.filter)(self.tree, node)
    }

    pub fn next_node(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        let mut current = self.current;
        loop {
            let mut node = if current != self.root && is_opaque(tree, current) {
                None
            } else {
                tree.first_child(current)
            };
            while node.is_none() {
                if current == self.root {
                    break;
                }
                match tree.next_sibling(current) {
                    Some(sibling) if is_opaque(tree, sibling) => {
                        self.current = sibling;
                        return Some(sibling);
                    }
                    Some(sibling) => node = Some(sibling),
                    None => match tree.parent(current) {
                        Some(parent) => current = parent,
                        None => break,
                    },
                }
            }
            let node = node?;
            if self.matches(node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }

    pub fn previous_node(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        let mut current = self.current;
        loop {
            if current == self.root {
                return None;
            }
            let node = match tree.previous_sibling(current) {
                Some(sibling) if is_opaque(tree, sibling) => {
                    self.current = sibling;
                    return Some(sibling);
                }
                Some(mut sibling) => {
                    while let Some(last) = tree.last_child(sibling) {
                        sibling = last;
                    }
                    sibling
                }
                None => tree.parent(current)?,
            };
            if self.matches(node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }
}

/// Nearest block before `node` in document order, excluding `root`
pub fn previous_block(tree: &Tree, schema: &Schema, node: NodeId, root: NodeId) -> Option<NodeId> {
    TreeWalker::new(tree, root, Show::Elements, |t: &Tree, n| schema.is_block(t, n))
        .starting_at(node)
        .previous_node()
        .filter(|&block| block != root)
}

/// Nearest block after `node` in document order, excluding `root`
pub fn next_block(tree: &Tree, schema: &Schema, node: NodeId, root: NodeId) -> Option<NodeId> {
    TreeWalker::new(tree, root, Show::Elements, |t: &Tree, n| schema.is_block(t, n))
        .starting_at(node)
        .next_node()
        .filter(|&block| block != root)
}

/// Nearest inclusive ancestor below `root` with the given tag and attribute values
pub fn nearest(
    tree: &Tree,
    node: NodeId,
    root: NodeId,
    tag: &str,
    attributes: &[(&str, &str)],
) -> Option<NodeId> {
    nearest_where(tree, node, root, |t, n| {
        t.element(n).is_some_and(|element| {
            element.has_tag(tag)
                && attributes
                    .iter()
                    .all(|(name, value)| element.attr(name) == Some(*value))
        })
    })
}

/// Nearest inclusive ancestor below `root` matching `predicate`
pub fn nearest_where<F>(tree: &Tree, node: NodeId, root: NodeId, predicate: F) -> Option<NodeId>
where
    F: Fn(&Tree, NodeId) -> bool,
{
    let mut current = Some(node);
    while let Some(candidate) = current {
        if candidate == root {
            return None;
        }
        if predicate(tree, candidate) {
            return Some(candidate);
        }
        current = tree.parent(candidate);
    }
    None
}
