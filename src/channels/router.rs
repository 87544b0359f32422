//! Channel registries.
//!
//! Order is registration order, never reordered and never deduplicated.
//! Lookups hand out snapshots so delivery can run without holding a borrow
//! on the router.

use std::collections::HashMap;

/// Push and broadcast registries keyed by channel name.
#[derive(Debug)]
pub struct ChannelRouter<P, B> {
    push: HashMap<String, Vec<P>>,
    broadcast: HashMap<String, Vec<B>>,
}

impl<P, B> Default for ChannelRouter<P, B> {
    fn default() -> Self {
        Self {
            push: HashMap::new(),
            broadcast: HashMap::new(),
        }
    }
}

impl<P: Clone, B: Clone> ChannelRouter<P, B> {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Push
    // -------------------------------------------------------------------------

    /// Add a push subscriber to `channel`.
    pub fn subscribe(&mut self, channel: &str, subscriber: P) {
        self.push.entry(channel.to_string()).or_default().push(subscriber);
    }

    /// Snapshot of push subscribers. Unknown channels yield nothing.
    pub fn push_targets(&self, channel: &str) -> Vec<P> {
        self.push.get(channel).cloned().unwrap_or_default()
    }

    pub fn push_subscribers(&self, channel: &str) -> usize {
        self.push.get(channel).map_or(0, Vec::len)
    }

    /// Drop every push subscription. Broadcast registrations stay.
    pub fn reset_channels(&mut self) {
        self.push.clear();
    }

    // -------------------------------------------------------------------------
    // Broadcast
    // -------------------------------------------------------------------------

    /// Add a broadcast registration to `channel`.
    pub fn register_broadcast(&mut self, channel: &str, registration: B) {
        self.broadcast
            .entry(channel.to_string())
            .or_default()
            .push(registration);
    }

    /// Snapshot of broadcast registrations. Unknown channels yield nothing.
    pub fn broadcast_targets(&self, channel: &str) -> Vec<B> {
        self.broadcast.get(channel).cloned().unwrap_or_default()
    }

    pub fn broadcast_subscribers(&self, channel: &str) -> usize {
        self.broadcast.get(channel).map_or(0, Vec::len)
    }

    /// Drop every broadcast registration.
    pub fn reset_broadcasts(&mut self) {
        self.broadcast.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
