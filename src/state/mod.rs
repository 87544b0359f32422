//! State Module - Diffable snapshots of a component's subtree.
//!
//! A component's state is the ordered list of [`Record`]s found in its
//! subtree: one record per top-level scope node. The component never edits
//! records directly; it goes through a [`StateStore`]:
//!
//! - `init(doc, node)` - capture the baseline snapshot
//! - `current()` - the working snapshot
//! - `diff_node(doc, node)` - describe how one scope node changed
//! - `update()` - commit the snapshot captured by the last diff
//! - `append / prepend / delete` - data operations on the working snapshot
//! - `revert()` - back to the last committed baseline
//! - `rollback()` - undo one step
//!
//! [`SnapshotState`] is the built-in store.

mod snapshot;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::Attributes;
use crate::dom::{Document, NodeId};

pub use snapshot::*;

// =============================================================================
// Types
// =============================================================================

/// One scoped region of a subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Record {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_value(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(prop.into(), value.into());
        self
    }

    pub fn value(&self, prop: &str) -> Option<&str> {
        self.values.get(prop).map(String::as_str)
    }

    /// Whether `other` identifies the same record.
    ///
    /// Records with ids match on scope and id; records without an id only
    /// match an identical record.
    pub fn same_record(&self, other: &Record) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b && self.scope == other.scope,
            _ => self == other,
        }
    }
}

/// A single prop that differs between two snapshots of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub prop: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Describes how one scope node changed against the captured state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    pub scope: String,
    pub id: Option<String>,
    /// The record as captured before the change, if it was known.
    pub before: Option<Record>,
    /// The record as the node looks now.
    pub after: Record,
    pub changes: Vec<Change>,
}

impl Mutation {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

// =============================================================================
// StateStore
// =============================================================================

/// Snapshot store behind a component.
pub trait StateStore {
    /// Capture the baseline snapshot of the subtree under `node`.
    fn init(&mut self, doc: &Document, node: NodeId);

    /// The working snapshot.
    fn current(&self) -> Vec<Record>;

    /// Diff one scope node against the working snapshot. The full subtree is
    /// captured as pending until [`StateStore::update`] commits it.
    fn diff_node(&mut self, doc: &Document, node: NodeId) -> Mutation;

    /// Commit the pending snapshot as working snapshot and baseline.
    fn update(&mut self);

    /// Discard uncommitted data operations. Returns the resulting snapshot.
    fn revert(&mut self) -> Vec<Record>;

    /// Undo the last step. Returns the resulting snapshot.
    fn rollback(&mut self) -> Vec<Record>;

    fn append(&mut self, record: Record);

    fn prepend(&mut self, record: Record);

    /// Remove the first record matching `record` (see [`Record::same_record`]).
    fn delete(&mut self, record: &Record);
}

/// Creates a fresh store for each component.
pub type StateFactory = Rc<dyn Fn(Rc<Attributes>) -> Box<dyn StateStore>>;
