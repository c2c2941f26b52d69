//! # Node Arena
//!
//! The document is a single arena of nodes addressed by [`NodeId`]. Every id carries
//! the generation of the slot it was issued for, so an id that outlives its node
//! (removed, slot reused) never aliases a different live node.
//!
//! Each element exclusively owns its children. Moving a node always detaches it from
//! its previous parent first, so the structure stays a tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DomError, DomResult};

/// Elements that never take children
pub const VOID_TAGS: &[&str] = &["BR", "IMG", "INPUT", "HR", "WBR"];

/// Generation-checked handle into a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Upper-cased tag name
    pub tag: String,
    pub class: Option<String>,
    /// Remaining attributes, ordered so serialization is stable
    pub attributes: BTreeMap<String, String>,
    /// `false` marks an opaque subtree the editing engine must not restructure
    pub editable: bool,
}

impl Element {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: tag.as_ref().to_ascii_uppercase(),
            class: None,
            attributes: BTreeMap::new(),
            editable: true,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in attributes {
            self.set_attr(name, value);
        }
        self
    }

    pub fn non_editable(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Set an attribute. `class` and `contenteditable` are routed to their fields.
    pub fn set_attr(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "class" => {
                self.class = if value.is_empty() { None } else { Some(value) };
            }
            "contenteditable" => {
                self.editable = !value.eq_ignore_ascii_case("false");
            }
            _ => {
                self.attributes.insert(name, value);
            }
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("class") {
            return self.class.as_deref();
        }
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn style(&self) -> Option<&str> {
        self.attributes.get("style").map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeData {
    Text { data: String },
    Element(Element),
    /// Unrooted carrier for extracted or inserted content
    Fragment,
}

impl NodeData {
    pub fn node_name(&self) -> &str {
        match self {
            NodeData::Text { .. } => "#text",
            NodeData::Element(element) => &element.tag,
            NodeData::Fragment => "#document-fragment",
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed document tree
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Tree {
    /// Create a tree whose root is the given element
    pub fn new(root: Element) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(NodeData::Element(root));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn live(&self, id: NodeId) -> DomResult<&Node> {
        self.node(id).ok_or(DomError::StaleNode(id))
    }

    fn live_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.node_mut(id).ok_or(DomError::StaleNode(id))
    }

    /// Whether `id` still refers to a live node
    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    // --- Creation ---

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text { data: data.into() })
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    // --- Inspection ---

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text { data }) => Some(data),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text { .. }))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element(_)))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Fragment))
    }

    /// DOM-style node name: upper-cased tag, `#text` or `#document-fragment`
    pub fn node_name(&self, id: NodeId) -> &str {
        self.data(id).map(NodeData::node_name).unwrap_or("")
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|element| element.has_tag(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of `id` among its parent's children
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child(parent, index + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// Child count for elements and fragments, character count for text
    pub fn length(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text { data }) => data.chars().count(),
            Some(_) => self.child_count(id),
            None => 0,
        }
    }

    /// Is-or-contains
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Proper ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Path of child indices from `root` down to `id`, or `None` if `id` is not under `root`
    pub fn path_from(&self, root: NodeId, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != root {
            path.push(self.index_of(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// False when the node or any ancestor below `root` is flagged non-editable
    pub fn is_editable(&self, id: NodeId, root: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            if self.element(node).is_some_and(|element| !element.editable) {
                return false;
            }
            current = self.parent(node);
        }
        true
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text { data }) => out.push_str(data),
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First descendant (pre-order) matching `predicate`
    pub fn find_descendant<F>(&self, id: NodeId, mut predicate: F) -> Option<NodeId>
    where
        F: FnMut(&Tree, NodeId) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .find(|&node| predicate(self, node))
    }

    // --- Mutation ---

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` so it ends up at `index` among the current children of `parent`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        let mut reference = self.child(parent, index);
        if reference == Some(child) {
            reference = self.next_sibling(child);
        }
        self.insert_before(parent, child, reference)
    }

    /// Insert `child` before `reference` (or at the end when `reference` is `None`).
    /// Fragments are spliced in and left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_can_hold_children(parent)?;
        self.live(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyCycle { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }

        if self.is_fragment(child) {
            let moved = std::mem::take(&mut self.live_mut(child)?.children);
            for &node in &moved {
                if let Some(node) = self.node_mut(node) {
                    node.parent = None;
                }
            }
            for node in moved {
                self.insert_single(parent, node, reference)?;
            }
            return Ok(());
        }

        self.insert_single(parent, child, reference)
    }

    fn insert_single(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.detach(child)?;
        let position = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|&c| c == reference)
                .unwrap_or_else(|| self.child_count(parent)),
            None => self.child_count(parent),
        };
        self.live_mut(parent)?.children.insert(position, child);
        self.live_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn check_can_hold_children(&self, parent: NodeId) -> DomResult<()> {
        match &self.live(parent)?.data {
            NodeData::Text { .. } => Err(DomError::NotAContainer(parent)),
            NodeData::Element(element) if element.is_void() => Err(DomError::VoidElement {
                tag: element.tag.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Detach from the parent, keeping the subtree alive. No-op for parentless nodes.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.live(id)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
            self.live_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Detach and free the whole subtree
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        if id == self.root {
            return Err(DomError::RootRemoval);
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let slot = &mut self.slots[node.index as usize];
            if slot.generation != node.generation {
                continue;
            }
            if let Some(removed) = slot.node.take() {
                stack.extend(removed.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        Ok(())
    }

    /// Put `new` where `old` is; `old` is detached but stays alive
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        if old == new {
            return Ok(());
        }
        let Some(parent) = self.parent(old) else {
            return Ok(());
        };
        self.insert_before(parent, new, Some(old))?;
        self.detach(old)
    }

    /// Move every child of `id` into a new fragment
    pub fn take_children(&mut self, id: NodeId) -> DomResult<NodeId> {
        let children = std::mem::take(&mut self.live_mut(id)?.children);
        let fragment = self.create_fragment();
        for &child in &children {
            self.live_mut(child)?.parent = Some(fragment);
        }
        self.live_mut(fragment)?.children = children;
        Ok(fragment)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> DomResult<()> {
        match &mut self.live_mut(id)?.data {
            NodeData::Text { data } => {
                *data = text.into();
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    pub fn append_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.live_mut(id)?.data {
            NodeData::Text { data } => {
                data.push_str(text);
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    /// Split a text node at a character offset. The tail becomes a new text node
    /// inserted right after the original (when it has a parent).
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let tail = match &mut self.live_mut(id)?.data {
            NodeData::Text { data } => {
                let length = data.chars().count();
                if offset > length {
                    return Err(DomError::OffsetOutOfBounds {
                        node: id,
                        offset,
                        length,
                    });
                }
                let at = char_to_byte(data, offset);
                data.split_off(at)
            }
            _ => return Err(DomError::NotText(id)),
        };
        let new_node = self.create_text(tail);
        if let Some(parent) = self.parent(id) {
            let reference = self.next_sibling(id);
            self.insert_before(parent, new_node, reference)?;
        }
        Ok(new_node)
    }

    /// Remove `count` characters starting at `offset`
    pub fn delete_text(&mut self, id: NodeId, offset: usize, count: usize) -> DomResult<()> {
        match &mut self.live_mut(id)?.data {
            NodeData::Text { data } => {
                let start = char_to_byte(data, offset);
                let end = char_to_byte(data, offset + count);
                data.replace_range(start..end, "");
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    /// Copy of the node without children
    pub fn shallow_clone(&mut self, id: NodeId) -> DomResult<NodeId> {
        let data = self.live(id)?.data.clone();
        Ok(self.alloc(data))
    }

    /// Copy of the whole subtree
    pub fn deep_clone(&mut self, id: NodeId) -> DomResult<NodeId> {
        let copy = self.shallow_clone(id)?;
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Merge adjacent text nodes and drop empty ones, throughout the subtree
    pub fn normalize(&mut self, id: NodeId) -> DomResult<()> {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            if let Some(data) = self.text(child).map(str::to_owned) {
                if data.is_empty() {
                    self.remove(child)?;
                } else if let Some(previous) = previous_text {
                    self.append_text(previous, &data)?;
                    self.remove(child)?;
                } else {
                    previous_text = Some(child);
                }
            } else {
                previous_text = None;
                self.normalize(child)?;
            }
        }
        Ok(())
    }
}

/// Iterator over proper ancestors
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Byte index of the `offset`-th character (clamped to the end)
pub fn char_to_byte(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_paragraph(text: &str) -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new(Element::new("div"));
        let p = tree.create_element(Element::new("p"));
        let t = tree.create_text(text);
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t).unwrap();
        (tree, p, t)
    }

    #[test]
    fn test_stale_id_does_not_alias_reused_slot() {
        let (mut tree, p, t) = tree_with_paragraph("hello");
        tree.remove(t).unwrap();
        let reused = tree.create_text("other");

        assert!(!tree.is_live(t));
        assert_eq!(tree.text(t), None);
        assert_eq!(tree.text(reused), Some("other"));
        assert_eq!(tree.append_child(p, t), Err(DomError::StaleNode(t)));
    }

    #[test]
    fn test_moving_node_detaches_from_previous_parent() {
        let (mut tree, p, t) = tree_with_paragraph("hello");
        let q = tree.create_element(Element::new("p"));
        tree.append_child(tree.root(), q).unwrap();

        tree.append_child(q, t).unwrap();

        assert_eq!(tree.child_count(p), 0);
        assert_eq!(tree.children(q), &[t]);
        assert_eq!(tree.parent(t), Some(q));
    }

    #[test]
    fn test_void_elements_refuse_children() {
        let mut tree = Tree::new(Element::new("div"));
        let br = tree.create_element(Element::new("br"));
        let t = tree.create_text("x");

        assert_eq!(
            tree.append_child(br, t),
            Err(DomError::VoidElement {
                tag: "BR".to_string()
            })
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let (mut tree, p, _) = tree_with_paragraph("x");
        let root = tree.root();
        assert!(matches!(
            tree.append_child(p, root),
            Err(DomError::HierarchyCycle { .. })
        ));
    }

    #[test]
    fn test_fragment_insertion_splices_children() {
        let (mut tree, p, t) = tree_with_paragraph("a");
        let fragment = tree.create_fragment();
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        tree.append_child(fragment, b).unwrap();
        tree.append_child(fragment, c).unwrap();

        tree.insert_before(p, fragment, Some(t)).unwrap();

        assert_eq!(tree.children(p), &[b, c, t]);
        assert_eq!(tree.child_count(fragment), 0);
        assert_eq!(tree.parent(b), Some(p));
    }

    #[test]
    fn test_split_text_uses_character_offsets() {
        let (mut tree, p, t) = tree_with_paragraph("héllo");
        let tail = tree.split_text(t, 2).unwrap();

        assert_eq!(tree.text(t), Some("hé"));
        assert_eq!(tree.text(tail), Some("llo"));
        assert_eq!(tree.children(p), &[t, tail]);
        assert_eq!(tree.length(tail), 3);
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let (mut tree, p, t) = tree_with_paragraph("ab");
        let empty = tree.create_text("");
        let cd = tree.create_text("cd");
        tree.append_child(p, empty).unwrap();
        tree.append_child(p, cd).unwrap();

        tree.normalize(p).unwrap();

        assert_eq!(tree.children(p), &[t]);
        assert_eq!(tree.text(t), Some("abcd"));
    }

    #[test]
    fn test_insert_child_counts_existing_position() {
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        for node in [a, b, c] {
            tree.append_child(root, node).unwrap();
        }

        tree.insert_child(root, 0, c).unwrap();
        assert_eq!(tree.children(root), &[c, a, b]);

        tree.insert_child(root, 1, c).unwrap();
        assert_eq!(tree.children(root), &[c, a, b]);
    }

    #[test]
    fn test_editable_flag_is_inherited() {
        let mut tree = Tree::new(Element::new("div"));
        let root = tree.root();
        let widget = tree.create_element(Element::new("mywo-content-widget").non_editable());
        let inner = tree.create_text("inside");
        tree.append_child(root, widget).unwrap();
        tree.append_child(widget, inner).unwrap();

        assert!(tree.is_editable(root, root));
        assert!(!tree.is_editable(widget, root));
        assert!(!tree.is_editable(inner, root));
    }
}
