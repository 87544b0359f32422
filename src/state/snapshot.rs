//! Built-in snapshot store.
//!
//! Records are read straight off the tree:
//!
//! ```text
//! <li data-scope="post" data-id="7" data-version="full">
//!   <h1 data-prop="title">Hello</h1>        -> values["title"] = "Hello"
//! </li>
//! ```
//!
//! Nested scopes belong to their own records and are not descended into.

use std::collections::BTreeSet;
use std::rc::Rc;

use super::{Change, Mutation, Record, StateStore};
use crate::config::Attributes;
use crate::dom::{Document, NodeId, Walk};

// =============================================================================
// Capture
// =============================================================================

/// Read the record a scope node represents.
pub fn record_of(doc: &Document, attrs: &Attributes, node: NodeId) -> Record {
    let mut record = Record::new(doc.attribute(node, &attrs.scope).unwrap_or_default());
    record.id = doc.attribute(node, &attrs.id).map(str::to_string);
    record.version = doc.attribute(node, &attrs.version).map(str::to_string);

    for prop_node in prop_nodes(doc, attrs, node) {
        if let Some(prop) = doc.attribute(prop_node, &attrs.prop) {
            let value = doc.value(prop_node).unwrap_or_default();
            record.values.insert(prop.to_string(), value.to_string());
        }
    }
    record
}

/// Prop-carrying nodes belonging to a scope node, in document order.
///
/// The scope node itself counts when it carries a prop. Nested scopes are
/// skipped.
pub fn prop_nodes(doc: &Document, attrs: &Attributes, scope_node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if doc.has_attribute(scope_node, &attrs.prop) {
        out.push(scope_node);
    }
    let mut stack: Vec<NodeId> = doc.children(scope_node).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if doc.has_attribute(node, &attrs.scope) {
            continue;
        }
        if doc.has_attribute(node, &attrs.prop) {
            out.push(node);
        }
        stack.extend(doc.children(node).iter().rev());
    }
    out
}

/// Top-level scope nodes under `root` in document order.
///
/// A root that is itself a scope is its own single record.
pub fn scope_nodes(doc: &Document, attrs: &Attributes, root: NodeId) -> Vec<NodeId> {
    if doc.has_attribute(root, &attrs.scope) {
        return vec![root];
    }
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if doc.has_attribute(node, &attrs.scope) {
            out.push(node);
            continue;
        }
        stack.extend(doc.children(node).iter().rev());
    }
    out
}

/// Capture every top-level record under `root`.
pub fn capture(doc: &Document, attrs: &Attributes, root: NodeId) -> Vec<(NodeId, Record)> {
    scope_nodes(doc, attrs, root)
        .into_iter()
        .map(|node| (node, record_of(doc, attrs, node)))
        .collect()
}

/// Every scope-marked node under `root`, excluding `root`, outermost first.
pub fn all_scoped(doc: &Document, attrs: &Attributes, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    doc.breadth_first(root, |node| {
        if node != root && doc.has_attribute(node, &attrs.scope) {
            out.push(node);
            // Removing the outer node takes the inner ones with it
            return Walk::Skip;
        }
        Walk::Continue
    });
    out
}

fn diff_values(before: Option<&Record>, after: &Record) -> Vec<Change> {
    let empty = Default::default();
    let previous = before.map(|r| &r.values).unwrap_or(&empty);
    let keys: BTreeSet<&String> = previous.keys().chain(after.values.keys()).collect();

    keys.into_iter()
        .filter_map(|prop| {
            let from = previous.get(prop);
            let to = after.values.get(prop);
            (from != to).then(|| Change {
                prop: prop.clone(),
                from: from.cloned(),
                to: to.cloned(),
            })
        })
        .collect()
}

// =============================================================================
// SnapshotState
// =============================================================================

/// Rollback steps kept per store. Older steps are dropped first.
pub const HISTORY_LIMIT: usize = 32;

/// Default [`StateStore`] that reads records from the document.
pub struct SnapshotState {
    attrs: Rc<Attributes>,
    root: Option<NodeId>,
    /// Last committed snapshot.
    baseline: Vec<Record>,
    /// Working snapshot.
    current: Vec<Record>,
    /// Nodes of `current`, only while it mirrors a capture.
    nodes: Vec<NodeId>,
    /// Earlier working snapshots, newest last.
    history: Vec<Vec<Record>>,
    /// Captured by `diff_node`, committed by `update`.
    pending: Option<Vec<(NodeId, Record)>>,
}

impl SnapshotState {
    pub fn new(attrs: Rc<Attributes>) -> Self {
        Self {
            attrs,
            root: None,
            baseline: Vec::new(),
            current: Vec::new(),
            nodes: Vec::new(),
            history: Vec::new(),
            pending: None,
        }
    }

    /// Depth of the rollback history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn set_captured(&mut self, captured: Vec<(NodeId, Record)>) {
        let (nodes, records): (Vec<_>, Vec<_>) = captured.into_iter().unzip();
        self.nodes = nodes;
        self.current = records;
    }

    fn remember(&mut self) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(self.current.clone());
    }

    fn checkpoint(&mut self) {
        self.remember();
        self.nodes.clear();
    }
}

impl StateStore for SnapshotState {
    fn init(&mut self, doc: &Document, node: NodeId) {
        self.root = Some(node);
        self.set_captured(capture(doc, &self.attrs, node));
        self.baseline = self.current.clone();
        self.history.clear();
        self.pending = None;
    }

    fn current(&self) -> Vec<Record> {
        self.current.clone()
    }

    fn diff_node(&mut self, doc: &Document, node: NodeId) -> Mutation {
        let after = record_of(doc, &self.attrs, node);
        let before = match self.nodes.iter().position(|n| *n == node) {
            Some(index) => self.current.get(index).cloned(),
            None => self
                .current
                .iter()
                .find(|record| record.id.is_some() && record.same_record(&after))
                .cloned(),
        };

        if let Some(root) = self.root {
            self.pending = Some(capture(doc, &self.attrs, root));
        }

        Mutation {
            scope: after.scope.clone(),
            id: after.id.clone(),
            changes: diff_values(before.as_ref(), &after),
            before,
            after,
        }
    }

    fn update(&mut self) {
        let Some(captured) = self.pending.take() else {
            return;
        };
        self.remember();
        self.set_captured(captured);
        self.baseline = self.current.clone();
    }

    fn revert(&mut self) -> Vec<Record> {
        self.current = self.baseline.clone();
        self.nodes.clear();
        self.history.clear();
        self.current()
    }

    fn rollback(&mut self) -> Vec<Record> {
        if let Some(previous) = self.history.pop() {
            self.current = previous;
            self.nodes.clear();
        }
        self.current()
    }

    fn append(&mut self, record: Record) {
        self.checkpoint();
        self.current.push(record);
    }

    fn prepend(&mut self, record: Record) {
        self.checkpoint();
        self.current.insert(0, record);
    }

    fn delete(&mut self, record: &Record) {
        let Some(index) = self.current.iter().position(|r| r.same_record(record)) else {
            return;
        };
        self.checkpoint();
        self.current.remove(index);
    }
}

// =============================================================================
// TESTS
// =============================================================================
