//! Host Events - DOM events delivered into the runtime.
//!
//! The runtime never polls its environment. The host forwards form
//! submissions and value changes with [`crate::Runtime::dispatch`]; the
//! runtime routes them to the listening components' mutable handler.

use crate::dom::NodeId;

bitflags::bitflags! {
    /// Event kinds a component listens to.
    ///
    /// Combine with bitwise OR: `EventMask::SUBMIT | EventMask::CHANGE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const SUBMIT = 1 << 0;
        const CHANGE = 1 << 1;
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::SUBMIT | Self::CHANGE
    }
}

/// Kind of a host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A form was submitted.
    Submit,
    /// A control's value changed.
    Change,
}

impl EventKind {
    pub fn mask(self) -> EventMask {
        match self {
            Self::Submit => EventMask::SUBMIT,
            Self::Change => EventMask::CHANGE,
        }
    }
}

/// An event raised by the host on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEvent {
    pub kind: EventKind,
    pub target: NodeId,
}

impl HostEvent {
    pub fn submit(target: NodeId) -> Self {
        Self { kind: EventKind::Submit, target }
    }

    pub fn change(target: NodeId) -> Self {
        Self { kind: EventKind::Change, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mask_listens_to_everything() {
        let mask = EventMask::default();
        assert!(mask.contains(EventKind::Submit.mask()));
        assert!(mask.contains(EventKind::Change.mask()));
    }

    #[test]
    fn test_submit_only_mask() {
        let mask = EventMask::SUBMIT;
        assert!(mask.contains(EventKind::Submit.mask()));
        assert!(!mask.contains(EventKind::Change.mask()));
    }
}
