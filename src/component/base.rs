//! Per-instance data every component carries.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::{Signal, signal};

use super::{ComponentHandle, DependentFn, WeakComponentHandle};
use crate::config::ComponentConfig;
use crate::dom::NodeId;
use crate::state::{Record, StateStore};
use crate::view::{Endpoint, Template, View};

/// State shared by all components, embedded in custom ones.
pub struct ComponentBase {
    pub(crate) view: View,
    pub(crate) name: String,
    pub(crate) id: usize,
    pub(crate) channel: Option<String>,
    pub(crate) config: ComponentConfig,
    pub(crate) state: Box<dyn StateStore>,
    pub(crate) templates: HashMap<String, Template>,
    /// Renderer override installed by `instruct`.
    pub(crate) endpoint: Option<Rc<dyn Endpoint>>,
    pub(crate) dependent: Option<DependentFn>,
    /// Committed state, observed by dependents.
    pub(crate) published: Signal<Vec<Record>>,
    pub(crate) handle: WeakComponentHandle,
    pub(crate) stop_dependent: Option<Box<dyn FnOnce()>>,
}

impl ComponentBase {
    pub fn new(
        view: View,
        name: impl Into<String>,
        id: usize,
        channel: Option<String>,
        config: ComponentConfig,
        state: Box<dyn StateStore>,
    ) -> Self {
        Self {
            view,
            name: name.into(),
            id,
            channel,
            config,
            state,
            templates: HashMap::new(),
            endpoint: None,
            dependent: None,
            published: signal(Vec::new()),
            handle: Weak::new(),
            stop_dependent: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn node(&self) -> NodeId {
        self.view.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordinal among instances of the same name, in creation order. Failed
    /// constructions consume an ordinal too.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn state(&self) -> &dyn StateStore {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> &mut dyn StateStore {
        self.state.as_mut()
    }

    pub fn templates(&self) -> &HashMap<String, Template> {
        &self.templates
    }

    /// Invoke `f` with the template registered for `scope`, if any.
    pub fn template<F: FnOnce(&Template)>(&self, scope: &str, f: F) {
        if let Some(template) = self.templates.get(scope) {
            f(template);
        }
    }

    pub fn endpoint(&self) -> Option<&Rc<dyn Endpoint>> {
        self.endpoint.as_ref()
    }

    pub fn set_endpoint(&mut self, endpoint: Option<Rc<dyn Endpoint>>) {
        self.endpoint = endpoint;
    }

    pub fn set_dependent(&mut self, callback: DependentFn) {
        self.dependent = Some(callback);
    }

    pub fn is_dependent(&self) -> bool {
        self.dependent.is_some()
    }

    /// Signal holding the committed state.
    pub fn published(&self) -> Signal<Vec<Record>> {
        self.published.clone()
    }

    /// Strong handle to this component once it is bound to a runtime.
    pub fn handle(&self) -> Option<ComponentHandle> {
        self.handle.upgrade()
    }

    pub(crate) fn publish(&self) {
        self.published.set(self.state.current());
    }
}

impl Drop for ComponentBase {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_dependent.take() {
            stop();
        }
    }
}
