//! Node arena with parent/children links.
//!
//! Mirrors the parent-index layout of a component registry: every node is an
//! index, parent and children are stored per index. Released subtrees go to
//! a free list and their slots are reused. Each slot carries a generation so
//! ids into a released subtree never compare equal to the slot's next node.

use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::error::{ComponentError, Result};

// =============================================================================
// Types
// =============================================================================

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot. Shared with earlier, released nodes.
    pub fn index(self) -> usize {
        self.index
    }
}

/// Traversal control for [`Document::breadth_first`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit this node's children.
    Continue,
    /// Do not descend into this node.
    Skip,
    /// End the walk.
    Stop,
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    generation: u32,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
            generation: 0,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// A live document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Released slots, reused before the arena grows.
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new("body")],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arena size, including released slots waiting for reuse.
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// True while `node` has not been released.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.index)
            .is_some_and(|data| data.generation == node.generation)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::new(tag))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let generation = self.nodes[index].generation;
                self.nodes[index] = NodeData { generation, ..data };
                NodeId { index, generation }
            }
            None => {
                let index = self.nodes.len();
                self.nodes.push(NodeData { generation: 0, ..data });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index].children
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.index].tag
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// True when the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.contains(child, parent) {
            return Err(ComponentError::Cycle(child));
        }
        self.detach(child);
        self.nodes[parent.index].children.push(child);
        self.nodes[child.index].parent = Some(parent);
        Ok(())
    }

    /// Move `node` directly after `reference` under the same parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(ComponentError::Detached(reference))?;
        if self.contains(node, parent) {
            return Err(ComponentError::Cycle(node));
        }
        self.detach(node);
        let siblings = &mut self.nodes[parent.index].children;
        let position = siblings
            .iter()
            .position(|sibling| *sibling == reference)
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(position, node);
        self.nodes[node.index].parent = Some(parent);
        Ok(())
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace_child(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self.parent(old).ok_or(ComponentError::Detached(old))?;
        if self.contains(replacement, parent) {
            return Err(ComponentError::Cycle(replacement));
        }
        self.detach(replacement);
        let siblings = &mut self.nodes[parent.index].children;
        if let Some(slot) = siblings.iter_mut().find(|sibling| **sibling == old) {
            *slot = replacement;
        }
        self.nodes[replacement.index].parent = Some(parent);
        self.nodes[old.index].parent = None;
        Ok(())
    }

    /// Remove the node from its parent in place. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index].parent.take() {
            self.nodes[parent.index].children.retain(|child| *child != node);
        }
    }

    /// Deep copy of a subtree. The copy is detached.
    pub fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let data = &self.nodes[node.index];
        let copy = NodeData {
            tag: data.tag.clone(),
            attributes: data.attributes.clone(),
            text: data.text.clone(),
            parent: None,
            children: Vec::new(),
            generation: 0,
        };
        let children = data.children.clone();

        let id = self.alloc(copy);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.nodes[child_copy.index].parent = Some(id);
            self.nodes[id.index].children.push(child_copy);
        }
        id
    }

    /// Detach a subtree and return its slots to the arena.
    ///
    /// Ids into the subtree go stale. The root and already released nodes
    /// are left alone.
    pub fn release(&mut self, node: NodeId) {
        if node == self.root || !self.is_live(node) {
            return;
        }
        self.detach(node);

        let mut stack = vec![node.index];
        while let Some(index) = stack.pop() {
            let data = &mut self.nodes[index];
            stack.extend(data.children.iter().map(|child| child.index));
            data.tag.clear();
            data.attributes.clear();
            data.text = None;
            data.parent = None;
            data.children.clear();
            data.generation = data.generation.wrapping_add(1);
            self.free.push(index);
        }
    }

    // -------------------------------------------------------------------------
    // Attributes & Content
    // -------------------------------------------------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.index]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attributes = &mut self.nodes[node.index].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.index].attributes.retain(|(key, _)| key != name);
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.index].text.as_deref()
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.nodes[node.index].text = Some(text.into());
    }

    /// Form value of a node: its `value` attribute, else its text.
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "value").or_else(|| self.text(node))
    }

    /// Write a form value where [`Document::value`] reads it from.
    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        if self.has_attribute(node, "value") {
            self.set_attribute(node, "value", value);
        } else {
            self.set_text(node, value);
        }
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// Descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// `root` and its descendants carrying `attribute`, in document order.
    pub fn by_attr(&self, root: NodeId, attribute: &str) -> Vec<NodeId> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|node| self.has_attribute(*node, attribute))
            .collect()
    }

    /// Breadth-first walk starting at `root`.
    pub fn breadth_first<F>(&self, root: NodeId, mut visit: F)
    where
        F: FnMut(NodeId) -> Walk,
    {
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            match visit(node) {
                Walk::Continue => queue.extend(self.children(node)),
                Walk::Skip => {}
                Walk::Stop => return,
            }
        }
    }

    /// Nearest ancestor-or-self carrying `attribute`.
    pub fn closest(&self, node: NodeId, attribute: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.has_attribute(current, attribute) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// True when the node is a `form` or sits inside one.
    pub fn in_form(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.tag(current).eq_ignore_ascii_case("form") {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Serialize a subtree as markup, for inspection and tests.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.index];
        let _ = write!(out, "<{}", data.tag);
        for (key, value) in &data.attributes {
            let _ = write!(out, " {key}=\"{value}\"");
        }
        out.push('>');
        if let Some(text) = &data.text {
            out.push_str(text);
        }
        for child in &data.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }
}

// =============================================================================
// TESTS
// =============================================================================
