//! # spark-components
//!
//! Markup-driven component framework for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) so
//! dependent components follow their parent's state reactively.
//!
//! ## Architecture
//!
//! Components are discovered from attributes on a document tree, bound to a
//! subtree, and addressed through named channels:
//! ```text
//! markup -> find_and_init -> Component (state + templates)
//!                               ^            |
//!            push / broadcast --+            +-- transform -> Endpoint -> tree
//! ```
//!
//! ## Modules
//!
//! - [`runtime`] - Discovery, registries, push/broadcast delivery, host events
//! - [`component`] - The `Component` capability and its base behaviour
//! - [`channels`] - Channel router (push subscriptions + broadcast callbacks)
//! - [`state`] - Record snapshots, diffing and history
//! - [`view`] - Scoped views, templates and renderers
//! - [`dom`] - The document tree components are bound to
//! - [`config`] - Attribute names, component config and runtime config

pub mod channels;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod runtime;
pub mod state;
pub mod view;

// Re-export commonly used items
pub use channels::ChannelRouter;

pub use component::{
    BaseComponent, BroadcastFn, Component, ComponentBase, ComponentHandle, DependentFn,
    InstanceDirectory, Instruction,
};

pub use config::{Attributes, ComponentConfig, RuntimeConfig};

pub use dom::{Document, Element, NodeId};

pub use error::{ComponentError, Result};

pub use events::{EventKind, EventMask, HostEvent};

pub use runtime::{Packet, Runtime, RuntimeBuilder};

pub use state::{Mutation, Record, SnapshotState, StateStore};

pub use view::{Binder, ClonedTemplate, Endpoint, Template, TemplateRenderer, View};
