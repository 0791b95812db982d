//! Error types.
//!
//! Three families of failures flow through the runtime:
//! - hook misuse (`HookOutsideRender`, order/count/type violations), which is
//!   always fatal to the render call
//! - component failures (`Thrown`) and host adapter failures (`Host`), which
//!   the nearest error boundary may catch
//! - failures nobody caught (`Uncaught`), returned from the root

use std::fmt;

use crate::hooks::HookKind;
use crate::types::{HostPosition, NodeId};

/// Errors produced by the rendering runtime.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("`{hook}` called outside of an active render")]
    HookOutsideRender { hook: &'static str },

    #[error("hook order changed in `{component}`: slot {slot} holds {expected:?} but {found:?} was called")]
    HookOrderViolation {
        component: String,
        slot: usize,
        expected: HookKind,
        found: HookKind,
    },

    #[error("hook count changed in `{component}`: previous render called {expected} hooks, this render called {found}")]
    HookCountMismatch {
        component: String,
        expected: usize,
        found: usize,
    },

    #[error("hook slot {slot} in `{component}` holds a value of a different type")]
    HookTypeMismatch { component: String, slot: usize },

    #[error("{message}")]
    Thrown { message: String },

    #[error("host adapter: {0}")]
    Host(#[from] HostError),

    #[error("uncaught render failure: {0}")]
    Uncaught(Box<RenderFailure>),

    #[error("updates did not settle after {ticks} ticks")]
    UpdateLimit { ticks: usize },
}

impl ViewError {
    /// Error raised by a component to signal a render failure.
    pub fn thrown(message: impl Into<String>) -> Self {
        ViewError::Thrown {
            message: message.into(),
        }
    }

    /// Hook protocol violations bypass error boundaries.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ViewError::HookOutsideRender { .. }
                | ViewError::HookOrderViolation { .. }
                | ViewError::HookCountMismatch { .. }
                | ViewError::HookTypeMismatch { .. }
        )
    }
}

/// Errors reported by a [`HostAdapter`](crate::host::HostAdapter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no sibling recorded at position {position}")]
    MissingSibling { position: HostPosition },

    #[error("unknown host instance {0}")]
    UnknownInstance(String),

    #[error("{0}")]
    Rejected(String),
}

// =============================================================================
// RenderFailure
// =============================================================================

/// A failure raised while rendering or committing a Node.
///
/// Carries the error, the failing Node, and the component path from the root
/// down to it (`App > ErrorBoundary > Thrower`).
#[derive(Debug)]
pub struct RenderFailure {
    pub error: ViewError,
    pub node: NodeId,
    pub path: Vec<String>,
}

impl RenderFailure {
    pub fn new(error: ViewError, node: NodeId, path: Vec<String>) -> Self {
        Self { error, node, path }
    }

    /// The path joined for display.
    pub fn trace(&self) -> String {
        self.path.join(" > ")
    }

    /// Message of the underlying error.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error, self.trace())
    }
}

impl std::error::Error for RenderFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
