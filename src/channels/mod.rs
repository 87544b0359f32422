//! Channels - Named pub/sub addresses between components.
//!
//! Every channel has two independent registries:
//!
//! - **push** - components that receive directed pushes (instructions or
//!   message bodies) sent to the channel
//! - **broadcast** - `(callback, owner)` pairs invoked on every broadcast
//!
//! Components never hold references to each other; they only know channel
//! names. The router is a plain data structure; delivery semantics live in
//! [`crate::Runtime`].

mod router;

pub use router::*;
