//! ErrorBoundary - catches failures raised below it.
//!
//! # State machine
//!
//! ```text
//! Normal ──failure──▶ Caught ──handler schedules an update──▶ Recovering
//!    ▲                                                            │
//!    └──────────────────── successful re-render ◀─────────────────┘
//! ```
//!
//! While `Caught`, the boundary renders nothing and its subtree is not
//! reconciled. Recovery is scoped: only the boundary's own subtree is
//! re-rendered.
//!
//! # Example
//!
//! ```ignore
//! ErrorBoundary::new(|failure, boundary| {
//!     tracing::warn!("caught {failure}");
//!     boundary.retry();
//! })
//! .child(risky.element(Props::new()))
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::element::Element;
use crate::error::RenderFailure;
use crate::hooks::{Update, UpdateQueue};
use crate::types::{Key, NodeId};

/// Failure handler signature.
pub type ErrorHandler = Rc<dyn Fn(&RenderFailure, &BoundaryHandle)>;

/// Boundary lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryState {
    #[default]
    Normal,
    Caught,
    Recovering,
}

/// Error boundary description.
#[derive(Clone)]
pub struct ErrorBoundary {
    pub key: Option<Key>,
    pub handler: ErrorHandler,
    pub children: Vec<Element>,
}

impl ErrorBoundary {
    pub fn new(handler: impl Fn(&RenderFailure, &BoundaryHandle) + 'static) -> Self {
        Self {
            key: None,
            handler: Rc::new(handler),
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

impl From<ErrorBoundary> for Element {
    fn from(value: ErrorBoundary) -> Self {
        Element::ErrorBoundary(value)
    }
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("key", &self.key)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// BoundaryHandle
// =============================================================================

/// Handed to the failure handler to schedule recovery.
pub struct BoundaryHandle {
    node: NodeId,
    queue: Weak<RefCell<UpdateQueue>>,
}

impl BoundaryHandle {
    pub(crate) fn new(node: NodeId, queue: Weak<RefCell<UpdateQueue>>) -> Self {
        Self { node, queue }
    }

    /// The boundary Node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Schedule a re-render of the boundary's subtree.
    pub fn retry(&self) {
        match self.queue.upgrade() {
            Some(queue) => queue.borrow_mut().push(Update::Retry { node: self.node }),
            None => tracing::warn!(node = %self.node, "retry on a dropped root ignored"),
        }
    }
}
