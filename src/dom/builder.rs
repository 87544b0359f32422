//! Element builder for creating subtrees without markup.
//!
//! ```ignore
//! let list = Element::new("ul")
//!     .attr("data-ui", "list")
//!     .child(Element::new("li").attr("data-scope", "item").text("one"));
//! let node = doc.append(doc.root(), &list)?;
//! ```

use super::{Document, NodeId};
use crate::error::Result;

/// Description of an element and its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

impl Document {
    /// Create a detached subtree from an element description.
    pub fn build(&mut self, element: &Element) -> NodeId {
        let node = self.create_element(&element.tag);
        for (name, value) in &element.attributes {
            self.set_attribute(node, name, value.as_str());
        }
        if let Some(text) = &element.text {
            self.set_text(node, text.as_str());
        }
        for child in &element.children {
            let child_node = self.build(child);
            // Fresh nodes cannot form a cycle
            let _ = self.append_child(node, child_node);
        }
        node
    }

    /// Build a subtree and append it under `parent`.
    pub fn append(&mut self, parent: NodeId, element: &Element) -> Result<NodeId> {
        let node = self.build(element);
        self.append_child(parent, node)?;
        Ok(node)
    }
}
