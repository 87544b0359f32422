//! Components - Stateful controllers bound to regions of the document.
//!
//! A component is discovered from markup (`data-ui="name"`), constructed by
//! the factory registered under that name (or as a [`BaseComponent`]), and
//! initialized once:
//!
//! ```text
//! discover -> construct -> init -> (mutated | instructed | messaged)*
//! ```
//!
//! # Capability
//!
//! [`Component`] carries the whole base behaviour as provided methods.
//! A custom component embeds a [`ComponentBase`], implements `base()` and
//! `base_mut()`, and overrides whatever it needs:
//!
//! ```ignore
//! struct Counter {
//!     base: ComponentBase,
//!     seen: usize,
//! }
//!
//! impl Component for Counter {
//!     fn base(&self) -> &ComponentBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ComponentBase { &mut self.base }
//!
//!     fn message(&mut self, _rt: &Runtime, _channel: &str, _payload: &Value) -> Result<()> {
//!         self.seen += 1;
//!         Ok(())
//!     }
//! }
//!
//! runtime.register("counter", |base| Counter { base, seen: 0 });
//! ```

mod base;
mod behavior;
mod directory;
mod instruct;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::dom::NodeId;
use crate::error::{ComponentError, Result};
use crate::events::EventMask;
use crate::runtime::Runtime;
use crate::state::{Mutation, Record};
use crate::view::Template;

pub use base::*;
pub use directory::*;
pub use instruct::*;

// =============================================================================
// Types
// =============================================================================

/// Shared handle to a live component.
pub type ComponentHandle = Rc<RefCell<Box<dyn Component>>>;

/// Non-owning handle to a live component.
pub type WeakComponentHandle = Weak<RefCell<Box<dyn Component>>>;

/// Builds a component from its base. Registered per name.
pub type ComponentFactory = Rc<dyn Fn(ComponentBase) -> Box<dyn Component>>;

/// Derives a dependent's rendering from its parent's state.
pub type DependentFn = Rc<dyn Fn(&[Record]) -> Vec<Record>>;

/// Broadcast callback, invoked bound to its owning component.
pub type BroadcastFn = Rc<dyn Fn(&mut dyn Component, &Runtime, &Value) -> Result<()>>;

// =============================================================================
// Component
// =============================================================================

/// Capability interface every component implements.
pub trait Component {
    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    /// Host events routed to the mutable handler.
    fn events(&self) -> EventMask {
        EventMask::default()
    }

    /// Runs last during `init`.
    fn inited(&mut self, _rt: &Runtime) -> Result<()> {
        Ok(())
    }

    /// Free-form push delivery.
    fn message(&mut self, _rt: &Runtime, _channel: &str, _payload: &Value) -> Result<()> {
        Ok(())
    }

    /// Applies a mutation descriptor before it is committed.
    fn mutation(&mut self, _rt: &Runtime, _mutation: &Mutation) -> Result<()> {
        Ok(())
    }

    /// Instruction methods beyond the base set.
    fn call_custom(&mut self, _rt: &Runtime, method: &str, _arg: &Value) -> Result<()> {
        Err(ComponentError::UnknownMethod {
            component: self.base().name().to_string(),
            method: method.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Base behaviour
    // -------------------------------------------------------------------------

    fn init(&mut self, rt: &Runtime) -> Result<()> {
        behavior::init(self, rt)
    }

    /// Register `callback` for broadcasts on `channel`, bound to this component.
    fn listen(&self, rt: &Runtime, channel: &str, callback: BroadcastFn) -> Result<()> {
        behavior::listen(self, rt, channel, callback)
    }

    fn instruct(&mut self, rt: &Runtime, channel: &str, instructions: Vec<Instruction>) -> Result<()> {
        behavior::instruct(self, rt, channel, instructions)
    }

    /// Execute one instruction method.
    fn call(&mut self, rt: &Runtime, method: &str, arg: &Value) -> Result<()> {
        behavior::call(self, rt, method, arg)
    }

    /// Diff `scope` against the captured state, apply and commit it.
    fn mutated(&mut self, rt: &Runtime, scope: NodeId) -> Result<()> {
        behavior::mutated(self, rt, scope)
    }

    fn transform(&mut self, rt: &Runtime, state: &[Record]) -> Result<()> {
        behavior::transform(self, rt, state)
    }

    fn revert(&mut self, rt: &Runtime) -> Result<()> {
        behavior::revert(self, rt)
    }

    fn rollback(&mut self, rt: &Runtime) -> Result<()> {
        behavior::rollback(self, rt)
    }

    fn append(&mut self, rt: &Runtime, record: Record) -> Result<()> {
        behavior::append(self, rt, record)
    }

    fn prepend(&mut self, rt: &Runtime, record: Record) -> Result<()> {
        behavior::prepend(self, rt, record)
    }

    fn delete(&mut self, rt: &Runtime, record: &Record) -> Result<()> {
        behavior::delete(self, rt, record)
    }

    /// First record of the nearest scope above this component.
    fn parent(&self, rt: &Runtime) -> Option<Record> {
        behavior::parent(self, rt)
    }

    /// Re-render from the parent component's state whenever it changes.
    /// Must be called before `init`.
    fn dependent(&mut self, callback: DependentFn) {
        self.base_mut().set_dependent(callback);
    }

    fn template(&self, scope: &str) -> Option<&Template> {
        self.base().templates().get(scope)
    }
}

// =============================================================================
// BaseComponent
// =============================================================================

/// Generic component used for names without a registered factory.
pub struct BaseComponent {
    base: ComponentBase,
}

impl BaseComponent {
    pub fn new(base: ComponentBase) -> Self {
        Self { base }
    }
}

impl Component for BaseComponent {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}
