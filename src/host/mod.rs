//! Host Adapter - the boundary to the platform tree.
//!
//! The reconciler never touches platform nodes itself. It asks a
//! [`HostAdapter`] to create instances, attach and detach them at a
//! [`HostPosition`], and patch their attributes.
//!
//! # Positional insertion
//!
//! Every attached child carries the position it was inserted at. An adapter
//! places a child by comparing positions with its existing siblings:
//!
//! ```text
//! equal position          → replace that sibling in place
//! first greater position  → insert before it
//! none greater            → append
//! ```
//!
//! Removal addresses the child by the same recorded position.
//!
//! [`MemoryHost`] implements this contract over an in-memory tree.

mod memory;

pub use memory::*;

use crate::element::Props;
use crate::error::HostError;
use crate::types::{HostPosition, NodeId};

/// Platform operations the reconciler needs.
pub trait HostAdapter {
    /// Handle to a platform node.
    type Instance: Clone;

    /// Create a detached instance. Text leaves use
    /// [`TEXT_TAG`](crate::element::TEXT_TAG) with their content under
    /// [`TEXT_VALUE`](crate::element::TEXT_VALUE).
    fn create_instance(&mut self, tag: &str, props: &Props, node: NodeId) -> Result<Self::Instance, HostError>;

    /// Attach `child` below `parent` at `position`.
    fn append_child(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        position: &HostPosition,
    ) -> Result<(), HostError>;

    /// Detach `child`, recorded at `position`, from `parent`.
    fn remove_child(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        position: &HostPosition,
    ) -> Result<(), HostError>;

    /// Patch `instance` from `old` to `new` props.
    fn commit_update(
        &mut self,
        instance: &Self::Instance,
        old: &Props,
        new: &Props,
        position: &HostPosition,
    ) -> Result<(), HostError>;
}
