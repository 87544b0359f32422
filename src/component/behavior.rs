//! Base behaviour behind the provided [`Component`] methods.
//!
//! Generic over `C: Component + ?Sized` so overrides on a concrete type are
//! still reached when the base calls back into `this`.

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use spark_signals::effect;
use tracing::{debug, trace};

use super::{BroadcastFn, Component, Instruction, WeakComponentHandle};
use crate::config::EMPTY_VERSION;
use crate::dom::NodeId;
use crate::error::{ComponentError, Result};
use crate::runtime::Runtime;
use crate::state::{Record, all_scoped, capture};
use crate::view::{Binder, Endpoint, Template, View, discard};

// =============================================================================
// Lifecycle
// =============================================================================

pub(crate) fn init<C: Component + ?Sized>(this: &mut C, rt: &Runtime) -> Result<()> {
    let attrs = rt.attributes();
    let node = this.base().node();

    {
        let mut doc = rt.document_mut();
        let base = this.base_mut();

        // Direct children marked as templates leave the live tree
        for child in doc.children(node).to_vec() {
            if !doc.has_attribute(child, &attrs.template) {
                continue;
            }
            doc.detach(child);
            doc.remove_attribute(child, &attrs.template);

            let scope = doc.attribute(child, &attrs.scope).unwrap_or_default().to_string();
            let view = View::new(child);
            match base.templates.get_mut(&scope) {
                Some(template) => template.views.push(view),
                None => {
                    base.templates.insert(scope.clone(), Template::new(scope, view));
                }
            }
        }

        base.state.init(&doc, node);
    }
    this.base().publish();

    attach_dependent(this, rt)?;
    rt.listen_events(node, this.events(), this.base().handle.clone());

    this.inited(rt)
}

fn attach_dependent<C: Component + ?Sized>(this: &mut C, rt: &Runtime) -> Result<()> {
    let Some(callback) = this.base().dependent.clone() else {
        return Ok(());
    };
    let Some(parent) = rt.parent_component(this.base().node()) else {
        debug!(name = %this.base().name(), "dependent component has no parent component");
        return Ok(());
    };
    let parent_state = match parent.try_borrow() {
        Ok(parent) => parent.base().published(),
        Err(_) => {
            return Err(ComponentError::Busy(format!(
                "parent of `{}`",
                this.base().name()
            )));
        }
    };

    let initial = callback(parent_state.get().as_slice());
    this.transform(rt, &initial)?;

    let child: WeakComponentHandle = this.base().handle.clone();
    let runtime = rt.downgrade();
    let mut primed = false;
    let stop = effect(move || {
        // Read first so the effect tracks the parent's state
        let state = parent_state.get();
        if !primed {
            primed = true;
            return;
        }
        let (Some(child), Some(rt)) = (child.upgrade(), runtime.upgrade()) else {
            return;
        };
        let next = callback(state.as_slice());
        let result = match child.try_borrow_mut() {
            Ok(mut child) => child.transform(&rt, &next),
            Err(_) => Err(ComponentError::Busy("dependent component".into())),
        };
        if let Err(err) = result {
            rt.report(err);
        }
    });
    this.base_mut().stop_dependent = Some(Box::new(stop));
    Ok(())
}

pub(crate) fn listen<C: Component + ?Sized>(
    this: &C,
    rt: &Runtime,
    channel: &str,
    callback: BroadcastFn,
) -> Result<()> {
    let owner = this
        .base()
        .handle()
        .ok_or_else(|| ComponentError::Unbound(this.base().name().to_string()))?;
    rt.register_for_broadcast(channel, callback, owner);
    Ok(())
}

// =============================================================================
// Instructions
// =============================================================================

pub(crate) fn instruct<C: Component + ?Sized>(
    this: &mut C,
    rt: &Runtime,
    channel: &str,
    instructions: Vec<Instruction>,
) -> Result<()> {
    this.base_mut().endpoint = Some(rt.instruct_endpoint());

    if let Some((placeholder, template)) = empty_placeholder(this, rt) {
        trace!(name = %this.base().name(), channel, "replacing empty placeholder before instructions");
        let handle = this.base().handle.clone();
        rt.template_renderer().render(
            rt,
            &template,
            Box::new(move |rt: &Runtime, rendered: NodeId| {
                if let Err(err) = replace_placeholder(rt, &handle, placeholder, rendered, &instructions) {
                    rt.report(err);
                }
            }),
        );
        return Ok(());
    }

    run_instructions(this, rt, &instructions)
}

/// The placeholder node and its template, when the only record is `empty`.
fn empty_placeholder<C: Component + ?Sized>(this: &C, rt: &Runtime) -> Option<(NodeId, Template)> {
    let current = this.base().state.current();
    let [only] = current.as_slice() else {
        return None;
    };

    let attrs = rt.attributes();
    let doc = rt.document();
    let node = this.base().view.scope(&doc, &attrs, &only.scope).views.first()?.node;
    if doc.attribute(node, &attrs.version) != Some(EMPTY_VERSION) {
        return None;
    }

    match this.base().templates.get(&only.scope) {
        Some(template) => Some((node, template.clone())),
        None => {
            debug!(scope = %only.scope, "empty placeholder without template");
            None
        }
    }
}

fn replace_placeholder(
    rt: &Runtime,
    handle: &WeakComponentHandle,
    placeholder: NodeId,
    rendered: NodeId,
    instructions: &[Instruction],
) -> Result<()> {
    let Some(component) = handle.upgrade() else {
        return Ok(());
    };
    let mut component = component
        .try_borrow_mut()
        .map_err(|_| ComponentError::Busy("instructed component".into()))?;

    {
        let attrs = rt.attributes();
        let mut doc = rt.document_mut();
        let node = component.base().node();
        if doc.is_live(placeholder) && doc.parent(placeholder).is_some() {
            doc.replace_child(placeholder, rendered)?;
            discard(&mut doc, &attrs, placeholder);
            component.base_mut().state.init(&doc, node);
        } else {
            // An earlier batch already replaced it
            trace!(name = %component.base().name(), "placeholder already replaced");
            doc.release(rendered);
        }
    }

    run_instructions(&mut **component, rt, instructions)
}

/// Run instructions in order, stopping at the first failure.
pub(crate) fn run_instructions<C: Component + ?Sized>(
    this: &mut C,
    rt: &Runtime,
    instructions: &[Instruction],
) -> Result<()> {
    for instruction in instructions {
        this.call(rt, &instruction.method, &instruction.arg)?;
    }
    Ok(())
}

pub(crate) fn call<C: Component + ?Sized>(
    this: &mut C,
    rt: &Runtime,
    method: &str,
    arg: &Value,
) -> Result<()> {
    match method {
        "append" => this.append(rt, decode(method, arg)?),
        "prepend" => this.prepend(rt, decode(method, arg)?),
        "delete" => this.delete(rt, &decode(method, arg)?),
        "transform" => {
            let state: Vec<Record> = decode(method, arg)?;
            this.transform(rt, &state)
        }
        "revert" => this.revert(rt),
        "rollback" => this.rollback(rt),
        _ => this.call_custom(rt, method, arg),
    }
}

fn decode<T: DeserializeOwned>(method: &str, arg: &Value) -> Result<T> {
    serde_json::from_value(arg.clone()).map_err(|source| ComponentError::InvalidArgument {
        method: method.to_string(),
        source,
    })
}

// =============================================================================
// Mutation & Rendering
// =============================================================================

pub(crate) fn mutated<C: Component + ?Sized>(this: &mut C, rt: &Runtime, scope: NodeId) -> Result<()> {
    let mutation = {
        let doc = rt.document();
        this.base_mut().state.diff_node(&doc, scope)
    };
    this.mutation(rt, &mutation)?;
    this.base_mut().state.update();
    this.base().publish();
    Ok(())
}

pub(crate) fn transform<C: Component + ?Sized>(this: &mut C, rt: &Runtime, state: &[Record]) -> Result<()> {
    let attrs = rt.attributes();
    let base = this.base();
    let mut doc = rt.document_mut();

    let Some(first) = state.first() else {
        for node in all_scoped(&doc, &attrs, base.view.node) {
            discard(&mut doc, &attrs, node);
        }
        return Ok(());
    };

    let mut scoped = base.view.scope(&doc, &attrs, &first.scope);
    if scoped.is_empty() {
        // Everything was removed; bring the scope back from its template
        if let Some(fragment) = base.templates.get(&first.scope).and_then(Template::first) {
            let copy = doc.clone_subtree(fragment.node);
            doc.append_child(base.view.node, copy)?;
            scoped = base.view.scope(&doc, &attrs, &first.scope);
        }
    }

    let endpoint: Rc<dyn Endpoint> = match base.endpoint.clone() {
        Some(endpoint) => endpoint,
        None => Rc::new(Binder),
    };
    scoped.endpoint(endpoint).apply(&mut doc, &attrs, state)
}

fn rerender<C: Component + ?Sized>(this: &mut C, rt: &Runtime, state: Vec<Record>) -> Result<()> {
    this.transform(rt, &state)?;
    this.base().publish();
    Ok(())
}

pub(crate) fn append<C: Component + ?Sized>(this: &mut C, rt: &Runtime, record: Record) -> Result<()> {
    this.base_mut().state.append(record);
    let current = this.base().state.current();
    rerender(this, rt, current)
}

pub(crate) fn prepend<C: Component + ?Sized>(this: &mut C, rt: &Runtime, record: Record) -> Result<()> {
    this.base_mut().state.prepend(record);
    let current = this.base().state.current();
    rerender(this, rt, current)
}

pub(crate) fn delete<C: Component + ?Sized>(this: &mut C, rt: &Runtime, record: &Record) -> Result<()> {
    this.base_mut().state.delete(record);
    let current = this.base().state.current();
    rerender(this, rt, current)
}

pub(crate) fn revert<C: Component + ?Sized>(this: &mut C, rt: &Runtime) -> Result<()> {
    let reverted = this.base_mut().state.revert();
    rerender(this, rt, reverted)
}

pub(crate) fn rollback<C: Component + ?Sized>(this: &mut C, rt: &Runtime) -> Result<()> {
    let previous = this.base_mut().state.rollback();
    rerender(this, rt, previous)
}

pub(crate) fn parent<C: Component + ?Sized>(this: &C, rt: &Runtime) -> Option<Record> {
    let attrs = rt.attributes();
    let doc = rt.document();
    let above = doc.parent(this.base().node())?;
    let scope = doc.closest(above, &attrs.scope)?;
    capture(&doc, &attrs, scope).into_iter().next().map(|(_, record)| record)
}
