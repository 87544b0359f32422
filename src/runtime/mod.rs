//! Runtime - The context that owns the document, registries and routing.
//!
//! One [`Runtime`] per page. It is a cheap `Rc` handle; clones share the
//! same state. Everything is single-threaded: the host drives it from one
//! event loop and nothing here is `Send`.
//!
//! # API
//!
//! - `register(name, factory)` - define a component (later wins)
//! - `find_and_init(root)` - discover and construct components
//! - `push(packet)` / `push_json(raw)` - directed delivery on a channel
//! - `register_for_broadcast` / `broadcast` - fan-out callbacks
//! - `reset_channels()` - drop push subscriptions only
//! - `dispatch(event)` - host submit/change events
//! - `defer(task)` / `run_pending()` - deferred continuations
//! - `take_failures()` - failures isolated by the runtime
//!
//! # Example
//!
//! ```ignore
//! let runtime = Runtime::new(document);
//! runtime.register("posts", |base| Posts::new(base));
//! runtime.find_and_init(runtime.root())?;
//!
//! runtime.push_json(r#"{"channel": "posts", "payload": {"instruct": [["append", {"scope": "post"}]]}}"#)?;
//! runtime.run_pending();
//! ```

mod delivery;
mod discovery;
mod packet;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::channels::ChannelRouter;
use crate::component::{
    BroadcastFn, Component, ComponentBase, ComponentFactory, ComponentHandle, InstanceDirectory,
    WeakComponentHandle,
};
use crate::config::{Attributes, RuntimeConfig};
use crate::dom::{Document, NodeId};
use crate::error::{ComponentError, Result};
use crate::events::EventMask;
use crate::state::{SnapshotState, StateFactory, StateStore};
use crate::view::{Binder, ClonedTemplate, Endpoint, TemplateRenderer};

pub use packet::*;

// =============================================================================
// Types
// =============================================================================

/// A broadcast registration: callback plus the component it is bound to.
#[derive(Clone)]
pub struct Broadcast {
    pub callback: BroadcastFn,
    pub owner: ComponentHandle,
}

#[derive(Clone)]
struct Listener {
    mask: EventMask,
    component: WeakComponentHandle,
}

type Task = Box<dyn FnOnce(&Runtime)>;

/// Delivery to a component that was busy when it was attempted.
type Requeued = Box<dyn FnOnce(&Runtime) -> Result<()>>;

struct RuntimeInner {
    config: RuntimeConfig,
    attributes: Rc<Attributes>,
    document: RefCell<Document>,
    definitions: RefCell<HashMap<String, ComponentFactory>>,
    directory: RefCell<InstanceDirectory<ComponentHandle>>,
    router: RefCell<ChannelRouter<ComponentHandle, Broadcast>>,
    /// Component root node -> instance.
    bound: RefCell<HashMap<NodeId, ComponentHandle>>,
    listeners: RefCell<HashMap<NodeId, Vec<Listener>>>,
    tasks: RefCell<VecDeque<Task>>,
    /// Nesting of push/broadcast/dispatch/discovery/task calls.
    depth: Cell<usize>,
    requeued: RefCell<VecDeque<Requeued>>,
    failures: RefCell<Vec<ComponentError>>,
    endpoint: Rc<dyn Endpoint>,
    templates: Rc<dyn TemplateRenderer>,
    state_factory: StateFactory,
}

// =============================================================================
// Builder
// =============================================================================

/// Configures collaborators before the runtime is created.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    endpoint: Rc<dyn Endpoint>,
    templates: Rc<dyn TemplateRenderer>,
    state_factory: StateFactory,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            config: RuntimeConfig::default(),
            endpoint: Rc::new(Binder),
            templates: Rc::new(ClonedTemplate),
            state_factory: Rc::new(|attrs: Rc<Attributes>| -> Box<dyn StateStore> {
                Box::new(SnapshotState::new(attrs))
            }),
        }
    }
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Endpoint installed on components by `instruct`.
    pub fn instruct_endpoint(mut self, endpoint: impl Endpoint + 'static) -> Self {
        self.endpoint = Rc::new(endpoint);
        self
    }

    pub fn template_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.templates = Rc::new(renderer);
        self
    }

    /// Store created for every component.
    pub fn state_store<F>(mut self, factory: F) -> Self
    where
        F: Fn(Rc<Attributes>) -> Box<dyn StateStore> + 'static,
    {
        self.state_factory = Rc::new(factory);
        self
    }

    pub fn build(self, document: Document) -> Runtime {
        let attributes = Rc::new(self.config.attributes.clone());
        Runtime {
            inner: Rc::new(RuntimeInner {
                config: self.config,
                attributes,
                document: RefCell::new(document),
                definitions: RefCell::new(HashMap::new()),
                directory: RefCell::new(InstanceDirectory::new()),
                router: RefCell::new(ChannelRouter::new()),
                bound: RefCell::new(HashMap::new()),
                listeners: RefCell::new(HashMap::new()),
                tasks: RefCell::new(VecDeque::new()),
                depth: Cell::new(0),
                requeued: RefCell::new(VecDeque::new()),
                failures: RefCell::new(Vec::new()),
                endpoint: self.endpoint,
                templates: self.templates,
                state_factory: self.state_factory,
            }),
        }
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Page-wide component context.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

/// Non-owning runtime handle for closures that outlive a call.
#[derive(Clone)]
pub struct WeakRuntime {
    inner: Weak<RuntimeInner>,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        self.inner.upgrade().map(|inner| Runtime { inner })
    }
}

impl Runtime {
    /// Runtime with default collaborators.
    pub fn new(document: Document) -> Self {
        Self::builder().build(document)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn attributes(&self) -> Rc<Attributes> {
        self.inner.attributes.clone()
    }

    /// Root node of the document.
    pub fn root(&self) -> NodeId {
        self.document().root()
    }

    /// Borrow the document. Do not hold across calls into components.
    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    /// Mutably borrow the document. Do not hold across calls into components.
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    // -------------------------------------------------------------------------
    // Definitions & Instances
    // -------------------------------------------------------------------------

    /// Register the factory for `name`. Re-registering replaces it.
    pub fn register<F, C>(&self, name: &str, factory: F)
    where
        F: Fn(ComponentBase) -> C + 'static,
        C: Component + 'static,
    {
        let factory: ComponentFactory =
            Rc::new(move |base: ComponentBase| -> Box<dyn Component> { Box::new(factory(base)) });
        let replaced = self
            .inner
            .definitions
            .borrow_mut()
            .insert(name.to_string(), factory)
            .is_some();
        debug!(name, replaced, "component registered");
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.definitions.borrow().contains_key(name)
    }

    /// Instances of `name` in creation order.
    ///
    /// A node that failed to initialize still consumed its ordinal, so a
    /// position in this list is not always the instance's id. Look ids up
    /// with [`Runtime::instance`].
    pub fn instances(&self, name: &str) -> Vec<ComponentHandle> {
        self.inner.directory.borrow().get(name).to_vec()
    }

    /// The instance of `name` carrying ordinal `id`. Ordinals are never
    /// reused, so ids after a failed construction have a gap.
    pub fn instance(&self, name: &str, id: usize) -> Option<ComponentHandle> {
        self.instances(name)
            .into_iter()
            .find(|handle| handle.try_borrow().is_ok_and(|c| c.base().id() == id))
    }

    /// The component bound to exactly this node.
    pub fn component_at(&self, node: NodeId) -> Option<ComponentHandle> {
        self.inner.bound.borrow().get(&node).cloned()
    }

    /// Nearest component strictly above `node`.
    pub fn parent_component(&self, node: NodeId) -> Option<ComponentHandle> {
        let owner = {
            let doc = self.document();
            let above = doc.parent(node)?;
            doc.closest(above, &self.inner.attributes.component)?
        };
        self.component_at(owner)
    }

    pub(crate) fn new_state(&self) -> Box<dyn StateStore> {
        (self.inner.state_factory)(self.attributes())
    }

    pub(crate) fn instruct_endpoint(&self) -> Rc<dyn Endpoint> {
        self.inner.endpoint.clone()
    }

    pub(crate) fn template_renderer(&self) -> Rc<dyn TemplateRenderer> {
        self.inner.templates.clone()
    }

    pub(crate) fn listen_events(&self, node: NodeId, mask: EventMask, component: WeakComponentHandle) {
        self.inner
            .listeners
            .borrow_mut()
            .entry(node)
            .or_default()
            .push(Listener { mask, component });
    }

    // -------------------------------------------------------------------------
    // Deferred tasks
    // -------------------------------------------------------------------------

    /// Queue a continuation for the next `run_pending`.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce(&Runtime) + 'static,
    {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Run queued continuations, including ones queued while running.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.inner.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                break;
            };
            let result = self.delivering(|rt| {
                task(rt);
                Ok(())
            });
            if let Err(err) = result {
                self.report(err);
            }
            ran += 1;
        }
        ran
    }

    // -------------------------------------------------------------------------
    // Re-entrant delivery
    // -------------------------------------------------------------------------

    /// Run `f` as one delivery. Work requeued while it runs is drained when
    /// the outermost delivery finishes and every component is released.
    fn delivering<T>(&self, f: impl FnOnce(&Runtime) -> Result<T>) -> Result<T> {
        let depth = &self.inner.depth;
        depth.set(depth.get() + 1);
        let result = f(self);
        depth.set(depth.get() - 1);
        if depth.get() > 0 {
            return result;
        }

        let drained = self.drain_requeued();
        let value = result?;
        drained.map(|()| value)
    }

    /// Queue a delivery for a component that is busy further up the stack.
    fn requeue<F>(&self, delivery: F)
    where
        F: FnOnce(&Runtime) -> Result<()> + 'static,
    {
        self.inner.requeued.borrow_mut().push_back(Box::new(delivery));
    }

    fn drain_requeued(&self) -> Result<()> {
        loop {
            let next = self.inner.requeued.borrow_mut().pop_front();
            let Some(delivery) = next else {
                return Ok(());
            };
            self.inner.depth.set(1);
            let result = delivery(self);
            self.inner.depth.set(0);
            self.settle(result)?;
        }
    }

    // -------------------------------------------------------------------------
    // Failures
    // -------------------------------------------------------------------------

    /// Log and keep a failure that was isolated from its caller.
    pub fn report(&self, err: ComponentError) {
        warn!(error = %err, "component failure");
        self.inner.failures.borrow_mut().push(err);
    }

    /// Failures reported since the last call.
    pub fn take_failures(&self) -> Vec<ComponentError> {
        std::mem::take(&mut *self.inner.failures.borrow_mut())
    }

    /// Isolate or propagate a failure according to the config.
    fn settle(&self, result: Result<()>) -> Result<()> {
        match result {
            Err(err) if self.inner.config.isolate_failures => {
                self.report(err);
                Ok(())
            }
            other => other,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
