//! Error types shared by discovery, routing and the component base.

use thiserror::Error;

use crate::dom::NodeId;

/// Everything that can go wrong while constructing, messaging or rendering
/// a component.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// An instruction named a method neither the base nor the component knows.
    #[error("component `{component}` has no instruction method `{method}`")]
    UnknownMethod { component: String, method: String },

    /// An instruction argument could not be decoded for its method.
    #[error("invalid argument for `{method}`: {source}")]
    InvalidArgument {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// An instruction entry was not a `[method, argument]` pair.
    #[error("malformed instruction: {0}")]
    MalformedInstruction(String),

    /// A packet or payload failed to decode.
    #[error("invalid packet: {0}")]
    Packet(#[from] serde_json::Error),

    /// Rendering targeted a scope with no nodes in the view.
    #[error("scope `{0}` has no nodes to render into")]
    MissingScope(String),

    /// The operation needs a node that is attached to a parent.
    #[error("node {0:?} is not attached to a parent")]
    Detached(NodeId),

    /// Moving the node would place it inside its own subtree.
    #[error("node {0:?} cannot be moved into its own subtree")]
    Cycle(NodeId),

    /// A component was re-entered while already borrowed.
    #[error("component is busy: {0}")]
    Busy(String),

    /// The component has not been bound to a runtime yet.
    #[error("component `{0}` is not bound to a runtime")]
    Unbound(String),

    /// Failure raised by a custom component.
    #[error("{0}")]
    Custom(String),
}

impl ComponentError {
    /// Convenience for custom components.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ComponentError>;
