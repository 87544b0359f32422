//! Document Tree - In-memory node arena the components bind to.
//!
//! Nodes are indices into one arena owned by the [`Document`]. Removing a
//! node only detaches it; its index stays valid so templates and detached
//! fragments can be cloned back into the tree later.
//!
//! - [`Document`] - arena, structure edits, attributes, traversal
//! - [`Element`] - builder for creating subtrees programmatically

mod builder;
mod document;

pub use builder::*;
pub use document::*;
