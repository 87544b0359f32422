//! Discovery - find component roots under a node and construct them.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use super::Runtime;
use crate::component::{BaseComponent, Component, ComponentBase, ComponentHandle};
use crate::config::ComponentConfig;
use crate::dom::NodeId;
use crate::error::Result;
use crate::view::View;

impl Runtime {
    /// Construct a component for every node under `root` (inclusive) that
    /// carries the component attribute, in document order.
    ///
    /// Nodes already bound to an instance are skipped. Returns how many
    /// components were constructed.
    pub fn find_and_init(&self, root: NodeId) -> Result<usize> {
        self.delivering(|rt| rt.discover(root))
    }

    fn discover(&self, root: NodeId) -> Result<usize> {
        let nodes = self.document().by_attr(root, &self.inner.attributes.component);
        let mut constructed = 0;

        for node in nodes {
            if self.inner.bound.borrow().contains_key(&node) {
                trace!(?node, "already bound");
                continue;
            }
            match self.init_node(node) {
                Ok(()) => constructed += 1,
                Err(err) => self.settle(Err(err))?,
            }
        }

        debug!(constructed, "component discovery finished");
        Ok(constructed)
    }

    fn init_node(&self, node: NodeId) -> Result<()> {
        let attrs = self.attributes();
        let (name, channel, config) = {
            let doc = self.document();
            (
                doc.attribute(node, &attrs.component).unwrap_or_default().to_string(),
                doc.attribute(node, &attrs.channel).map(str::to_string),
                ComponentConfig::from_attribute(doc.attribute(node, &attrs.config)),
            )
        };

        let factory = self.inner.definitions.borrow().get(&name).cloned();
        let id = self.inner.directory.borrow_mut().next_ordinal(&name);
        let base = ComponentBase::new(
            View::new(node),
            name.as_str(),
            id,
            channel.clone(),
            config,
            self.new_state(),
        );

        let component: Box<dyn Component> = match factory {
            Some(factory) => factory(base),
            None => Box::new(BaseComponent::new(base)),
        };
        let handle: ComponentHandle = Rc::new(RefCell::new(component));
        handle.borrow_mut().base_mut().handle = Rc::downgrade(&handle);
        self.inner.bound.borrow_mut().insert(node, handle.clone());

        let initialized = handle.borrow_mut().init(self);
        if let Err(err) = initialized {
            debug!(%name, id, error = %err, "component failed to initialize");
            self.inner.bound.borrow_mut().remove(&node);
            self.inner.listeners.borrow_mut().remove(&node);
            return Err(err);
        }

        if let Some(channel) = &channel {
            self.inner.router.borrow_mut().subscribe(channel, handle.clone());
        }
        self.inner.directory.borrow_mut().insert(&name, handle);

        debug!(%name, id, ?channel, "component initialized");
        Ok(())
    }
}
