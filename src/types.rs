//! Core types shared by every layer of the runtime.
//!
//! - [`NodeId`] - generational handle to a live Node in the store
//! - [`Key`] - stable sibling identity attached to a description
//! - [`HostPosition`] - positional path used to order host siblings
//! - [`NodeFlags`] - lifecycle bits of a Node
//! - [`Cleanup`] - boxed teardown closure returned by effects

use std::fmt;
use std::rc::Rc;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by effects.
///
/// Runs before the effect fires again and when the owning Node unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// NodeId
// =============================================================================

/// Handle to a Node in the [`NodeStore`](crate::engine::NodeStore).
///
/// The generation changes every time an index is released, so an id held
/// past its Node's unmount never resolves to whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena index of this node.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the arena slot when this id was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Key
// =============================================================================

/// Explicit sibling identity.
///
/// Without a key a child is identified by its position among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s:?}"),
            Key::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

// =============================================================================
// HostPosition
// =============================================================================

/// Position of a host instance below its host parent.
///
/// The path holds the child-slot index of every Node between the host parent
/// (exclusive) and the host node (inclusive). A host child sitting directly
/// under a host parent has a one-element path, i.e. a plain index. Components
/// and fragments in between add one segment each.
///
/// Paths compare lexicographically, so sorting siblings by position yields
/// the rendered order no matter which siblings were inserted or removed
/// earlier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostPosition(Vec<usize>);

impl HostPosition {
    /// Build a position from a root-to-leaf path.
    pub fn new(path: Vec<usize>) -> Self {
        Self(path)
    }

    /// A single-segment position.
    pub fn index(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// Innermost segment (the host node's own slot index).
    pub fn leaf(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<usize> for HostPosition {
    fn from(value: usize) -> Self {
        HostPosition::index(value)
    }
}

impl fmt::Display for HostPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Node Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle bits of a Node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Committed to the host at least once.
        const MOUNTED = 1 << 0;
        /// Torn down. Irreversible.
        const UNMOUNTED = 1 << 1;
        /// A state update is waiting for the next render.
        const DIRTY = 1 << 2;
        /// The component function completed at least one render.
        const RENDERED = 1 << 3;
        /// Scheduled for removal in the pending commit.
        const DETACHED = 1 << 4;
    }
}
