//! # spark-view
//!
//! Hook-based UI reconciliation runtime for Rust.
//!
//! ## Architecture
//!
//! Components are plain functions from props to a description tree. The
//! runtime keeps a persistent tree of Nodes in a generational arena, diffs
//! every new description against it and drives a pluggable host through the
//! minimal set of mutations.
//!
//! ```text
//! Component fns → Element tree → render (diff) → commit → HostAdapter
//!                      ▲                                      │
//!                      └──── hooks / update queue ◀── effects ┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, Key, HostPosition, NodeFlags)
//! - [`element`] - Descriptions and props
//! - [`engine`] - Node arena
//! - [`hooks`] - Positional hook runtime (state, effects, context, refs)
//! - [`context`] - Provider stacks
//! - [`primitives`] - Components and error boundaries
//! - [`host`] - Host adapter trait and the in-memory host
//! - [`pipeline`] - Render, commit and the [`Root`] handle
//!
//! ## Example
//!
//! ```ignore
//! use spark_view::{render, use_state, Component, Element, MemoryHost, Props};
//!
//! let counter = Component::new("Counter", |_props: &Props| {
//!     let (count, set_count) = use_state(0)?;
//!     if count < 3 {
//!         set_count.set(count + 1);
//!     }
//!     Ok(Element::host("span").child(count.to_string()).into())
//! });
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let mut root = render(counter.element(Props::new()), host, container)?;
//! root.run_until_idle()?;
//!
//! assert_eq!(root.host().to_markup(container), "<root><span>3</span></root>");
//! ```

pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod host;
pub mod pipeline;
pub mod primitives;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use element::{Element, HostElement, PropValue, Props};

pub use context::{provider_depth, reset_context_stacks, Context, ContextId};

pub use error::{HostError, RenderFailure, ViewError};

pub use hooks::{
    reset_render_stack, use_context, use_effect, use_layout_effect, use_ref, use_state,
    use_state_with, HookKind, Ref, SetState,
};

pub use primitives::{BoundaryHandle, BoundaryState, Component, ComponentId, ErrorBoundary};

pub use engine::{Node, NodeKind};

pub use host::{HostAdapter, HostNode, HostNodeId, HostOp, MemoryHost};

pub use pipeline::{render, render_with_config, Root, RootConfig};
