//! Delivery - push, broadcast and host event routing.
//!
//! All delivery is synchronous and follows registration order. Each
//! delivery iterates a snapshot of its registry, so subscribers may
//! subscribe, push or broadcast while being delivered to.
//!
//! A subscriber that is still running further up the stack (a component
//! broadcasting to its own listener, say) cannot be borrowed again. Its
//! delivery is queued and runs once the outermost runtime call has
//! released every component, before that call returns.

use serde_json::Value;
use tracing::trace;

use super::{Broadcast, Packet, Runtime};
use crate::component::{BroadcastFn, Component, ComponentHandle, Instruction};
use crate::error::{ComponentError, Result};
use crate::events::{EventKind, HostEvent};

fn deliver_packet(
    component: &mut dyn Component,
    rt: &Runtime,
    channel: &str,
    instructions: Option<&[Instruction]>,
    payload: &Value,
) -> Result<()> {
    match instructions {
        Some(list) => component.instruct(rt, channel, list.to_vec()),
        None => component.message(rt, channel, payload),
    }
}

impl Broadcast {
    fn invoke(&self, rt: &Runtime, channel: &str, payload: &Value) -> Result<()> {
        let mut owner = self
            .owner
            .try_borrow_mut()
            .map_err(|_| ComponentError::Busy(format!("broadcast owner on `{channel}`")))?;
        (self.callback)(&mut **owner, rt, payload)
    }
}

impl Runtime {
    // -------------------------------------------------------------------------
    // Push
    // -------------------------------------------------------------------------

    /// Deliver a packet to every push subscriber of its channel.
    ///
    /// A payload carrying `instruct` runs the instructions on each
    /// subscriber; any other payload goes to the subscriber's `message`.
    pub fn push(&self, packet: &Packet) -> Result<()> {
        let instructions = packet.instructions().transpose()?;
        self.delivering(|rt| rt.push_now(packet, instructions.as_deref()))
    }

    fn push_now(&self, packet: &Packet, instructions: Option<&[Instruction]>) -> Result<()> {
        let channel = packet.channel.as_str();
        let targets = self.inner.router.borrow().push_targets(channel);
        trace!(
            channel,
            subscribers = targets.len(),
            instruct = instructions.is_some(),
            "push"
        );

        for target in targets {
            let delivered = target.try_borrow_mut().ok().map(|mut component| {
                deliver_packet(&mut **component, self, channel, instructions, &packet.payload)
            });
            let result = match delivered {
                Some(result) => result,
                None => {
                    trace!(channel, "push subscriber busy, queued");
                    let channel = channel.to_string();
                    let instructions = instructions.map(<[Instruction]>::to_vec);
                    let payload = packet.payload.clone();
                    self.requeue(move |rt| {
                        let mut component = target.try_borrow_mut().map_err(|_| {
                            ComponentError::Busy(format!("push subscriber on `{channel}`"))
                        })?;
                        deliver_packet(&mut **component, rt, &channel, instructions.as_deref(), &payload)
                    });
                    Ok(())
                }
            };
            self.settle(result)?;
        }
        Ok(())
    }

    /// Decode a packet from the messaging transport and push it.
    pub fn push_json(&self, raw: &str) -> Result<()> {
        let packet = Packet::from_json(raw)?;
        self.push(&packet)
    }

    /// Add `component` as a push subscriber of `channel`.
    pub fn register_for_channel(&self, channel: &str, component: ComponentHandle) {
        self.inner.router.borrow_mut().subscribe(channel, component);
    }

    pub fn push_subscribers(&self, channel: &str) -> usize {
        self.inner.router.borrow().push_subscribers(channel)
    }

    /// Drop all push subscriptions. Broadcast registrations and live
    /// instances are untouched.
    pub fn reset_channels(&self) {
        self.inner.router.borrow_mut().reset_channels();
    }

    // -------------------------------------------------------------------------
    // Broadcast
    // -------------------------------------------------------------------------

    /// Register `callback` bound to `owner`. Duplicates are kept.
    pub fn register_for_broadcast(&self, channel: &str, callback: BroadcastFn, owner: ComponentHandle) {
        self.inner
            .router
            .borrow_mut()
            .register_broadcast(channel, Broadcast { callback, owner });
    }

    /// Invoke every callback registered on `channel` with `payload`.
    pub fn broadcast(&self, channel: &str, payload: &Value) -> Result<()> {
        self.delivering(|rt| rt.broadcast_now(channel, payload))
    }

    fn broadcast_now(&self, channel: &str, payload: &Value) -> Result<()> {
        let targets = self.inner.router.borrow().broadcast_targets(channel);
        trace!(channel, subscribers = targets.len(), "broadcast");

        for registration in targets {
            let delivered = registration
                .owner
                .try_borrow_mut()
                .ok()
                .map(|mut owner| (registration.callback)(&mut **owner, self, payload));
            let result = match delivered {
                Some(result) => result,
                None => {
                    trace!(channel, "broadcast owner busy, queued");
                    let channel = channel.to_string();
                    let payload = payload.clone();
                    self.requeue(move |rt| registration.invoke(rt, &channel, &payload));
                    Ok(())
                }
            };
            self.settle(result)?;
        }
        Ok(())
    }

    pub fn broadcast_subscribers(&self, channel: &str) -> usize {
        self.inner.router.borrow().broadcast_subscribers(channel)
    }

    /// Drop all broadcast registrations.
    pub fn reset_broadcasts(&self) {
        self.inner.router.borrow_mut().reset_broadcasts();
    }

    // -------------------------------------------------------------------------
    // Host events
    // -------------------------------------------------------------------------

    /// Route a host event to the mutable handler of every listening
    /// component from the target up to the root.
    ///
    /// Returns true when a component handled the event, meaning the host
    /// should suppress its default action. Change events inside a form are
    /// left to the form's submit.
    pub fn dispatch(&self, event: HostEvent) -> bool {
        let mut handled = false;
        let result = self.delivering(|rt| {
            handled = rt.dispatch_now(event);
            Ok(())
        });
        if let Err(err) = result {
            self.report(err);
        }
        handled
    }

    fn dispatch_now(&self, event: HostEvent) -> bool {
        let (path, in_form, scope) = {
            let doc = self.document();
            let mut path = Vec::new();
            let mut cursor = Some(event.target);
            while let Some(node) = cursor {
                path.push(node);
                cursor = doc.parent(node);
            }
            (
                path,
                doc.in_form(event.target),
                doc.closest(event.target, &self.inner.attributes.scope),
            )
        };

        if event.kind == EventKind::Change && in_form {
            return false;
        }

        let mut handled = false;
        for node in path {
            let listeners = self.inner.listeners.borrow().get(&node).cloned().unwrap_or_default();
            for listener in listeners {
                if !listener.mask.contains(event.kind.mask()) {
                    continue;
                }
                let Some(component) = listener.component.upgrade() else {
                    continue;
                };
                handled = true;

                let Some(scope) = scope else {
                    continue;
                };
                trace!(?node, ?scope, kind = ?event.kind, "mutable event");
                let result = match component.try_borrow_mut() {
                    Ok(mut component) => component.mutated(self, scope),
                    Err(_) => Err(ComponentError::Busy("event listener".into())),
                };
                if let Err(err) = result {
                    self.report(err);
                }
            }
        }
        handled
    }
}
