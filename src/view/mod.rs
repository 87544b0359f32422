//! View Module - Bound subtrees, scopes, templates and renderers.
//!
//! - [`View`] - a node a component is bound to
//! - [`ScopedView`] - every node of one scope inside a view
//! - [`Template`] - detached fragments kept to re-materialize a scope
//! - [`Endpoint`] - renders a state sequence into a scoped view
//! - [`TemplateRenderer`] - produces a live node from a template, possibly later

mod render;

use std::rc::Rc;

use crate::config::Attributes;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::state::Record;

pub use render::*;

// =============================================================================
// Views
// =============================================================================

/// A node a component or template is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub node: NodeId,
}

impl View {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// All descendants marked with scope `name`, in document order.
    pub fn scope(&self, doc: &Document, attrs: &Attributes, name: &str) -> ScopedView {
        let views = doc
            .descendants(self.node)
            .into_iter()
            .filter(|node| doc.attribute(*node, &attrs.scope) == Some(name))
            .map(View::new)
            .collect();
        ScopedView {
            scope: name.to_string(),
            views,
        }
    }
}

/// The nodes of one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedView {
    pub scope: String,
    pub views: Vec<View>,
}

impl ScopedView {
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.views.iter().map(|view| view.node).collect()
    }

    /// Bind this view to the endpoint that will render it.
    pub fn endpoint(&self, endpoint: Rc<dyn Endpoint>) -> BoundView<'_> {
        BoundView { view: self, endpoint }
    }
}

/// A scoped view paired with its renderer.
pub struct BoundView<'a> {
    view: &'a ScopedView,
    endpoint: Rc<dyn Endpoint>,
}

impl BoundView<'_> {
    pub fn apply(&self, doc: &mut Document, attrs: &Attributes, state: &[Record]) -> Result<()> {
        self.endpoint.apply(doc, attrs, self.view, state)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Detached fragments registered for one scope, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub scope: String,
    pub views: Vec<View>,
}

impl Template {
    pub fn new(scope: impl Into<String>, first: View) -> Self {
        Self {
            scope: scope.into(),
            views: vec![first],
        }
    }

    pub fn first(&self) -> Option<View> {
        self.views.first().copied()
    }
}
