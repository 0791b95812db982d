//! View Engine - the persistent Node tree.
//!
//! The engine manages the core data structures:
//! - Node: one rendered instance (kind, props, hook slots, child slots)
//! - NodeStore: generational arena holding every live Node
//!
//! # Architecture
//!
//! Nodes are NOT linked by pointers. They refer to each other by [`NodeId`]
//! through the store:
//!
//! ```text
//! #0v0: App        (parent=None, children=[#1v0])
//! #1v0: div        (parent=#0v0, children=[#2v0, None, #3v0])
//! #2v0: "hello"    (parent=#1v0)
//! #3v0: Counter    (parent=#1v0, hooks=[State(3)])
//! ```
//!
//! Empty child slots stay in place so positional identity survives
//! conditional children.
//!
//! [`NodeId`]: crate::types::NodeId

mod node;
mod registry;

pub use node::*;
pub use registry::*;
