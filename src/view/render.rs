//! Renderers - endpoints that write records into the tree, and template
//! renderers that materialize detached templates.

use super::{ScopedView, Template};
use crate::config::Attributes;
use crate::dom::{Document, NodeId};
use crate::error::{ComponentError, Result};
use crate::runtime::Runtime;
use crate::state::{Record, prop_nodes};

// =============================================================================
// Endpoint
// =============================================================================

/// Renders a state sequence into a scoped view.
///
/// A component renders through itself by default. Instruction senders
/// install their own endpoint to control how their instructions render.
pub trait Endpoint {
    fn apply(
        &self,
        doc: &mut Document,
        attrs: &Attributes,
        view: &ScopedView,
        state: &[Record],
    ) -> Result<()>;
}

/// Default endpoint: binds records onto the scope's nodes in order.
///
/// Extra records get a clone of the last node inserted after the previous
/// one; surplus nodes are detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binder;

impl Endpoint for Binder {
    fn apply(
        &self,
        doc: &mut Document,
        attrs: &Attributes,
        view: &ScopedView,
        state: &[Record],
    ) -> Result<()> {
        let nodes = view.nodes();
        let Some(&prototype) = nodes.last() else {
            return Err(ComponentError::MissingScope(view.scope.clone()));
        };

        let mut previous: Option<NodeId> = None;
        for (i, record) in state.iter().enumerate() {
            let node = match nodes.get(i) {
                Some(node) => *node,
                None => {
                    let copy = doc.clone_subtree(prototype);
                    doc.insert_after(previous.unwrap_or(prototype), copy)?;
                    copy
                }
            };
            bind_record(doc, attrs, node, record);
            previous = Some(node);
        }

        for surplus in nodes.iter().skip(state.len()) {
            discard(doc, attrs, *surplus);
        }
        Ok(())
    }
}

/// Take a node out of the tree for good.
///
/// Subtrees without component roots are released back to the arena.
/// Subtrees holding a component stay allocated, detached, because the
/// runtime still refers to their nodes.
pub fn discard(doc: &mut Document, attrs: &Attributes, node: NodeId) {
    if doc.by_attr(node, &attrs.component).is_empty() {
        doc.release(node);
    } else {
        doc.detach(node);
    }
}

/// Write a record's id, version and prop values onto a scope node.
pub fn bind_record(doc: &mut Document, attrs: &Attributes, node: NodeId, record: &Record) {
    match &record.id {
        Some(id) => doc.set_attribute(node, &attrs.id, id.as_str()),
        None => doc.remove_attribute(node, &attrs.id),
    }
    match &record.version {
        Some(version) => doc.set_attribute(node, &attrs.version, version.as_str()),
        None => doc.remove_attribute(node, &attrs.version),
    }

    for prop_node in prop_nodes(doc, attrs, node) {
        let value = doc
            .attribute(prop_node, &attrs.prop)
            .and_then(|prop| record.value(prop))
            .map(str::to_string);
        if let Some(value) = value {
            doc.set_value(prop_node, value);
        }
    }
}

// =============================================================================
// Template Renderer
// =============================================================================

/// Continuation receiving the rendered, still detached, node.
pub type TemplateDone = Box<dyn FnOnce(&Runtime, NodeId)>;

/// Produces a live node for a template. May complete later.
pub trait TemplateRenderer {
    fn render(&self, rt: &Runtime, template: &Template, done: TemplateDone);
}

/// Default renderer: clones the template's first fragment and completes on
/// the runtime's deferred task queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClonedTemplate;

impl TemplateRenderer for ClonedTemplate {
    fn render(&self, rt: &Runtime, template: &Template, done: TemplateDone) {
        let Some(view) = template.first() else {
            tracing::warn!(scope = %template.scope, "template has no fragments");
            return;
        };
        let node = rt.document_mut().clone_subtree(view.node);
        rt.defer(move |rt| done(rt, node));
    }
}

// =============================================================================
// TESTS
// =============================================================================
