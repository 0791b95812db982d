//! Reconciliation Pipeline
//!
//! This module connects component descriptions to the host tree.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Element tree → render (diff) → Work log → commit → layout effects
//!                                                  ↘ passive effects (next tick)
//! ```
//!
//! ## Data Flow
//!
//! 1. **render** - Diffs descriptions against the Node tree, runs components,
//!    records mutations and effects
//! 2. **commit** - Replays the log through the [`HostAdapter`](crate::HostAdapter)
//! 3. **effects** - Layout effects right after the commit, passive effects on
//!    the next tick
//!
//! ## Key Design Principles
//!
//! - **No host calls while rendering**: a failed subtree is undone by
//!   truncating the log, the host never sees it
//! - **Updates between passes**: setters only enqueue; the root applies the
//!   queue and re-renders the dirty Nodes, shallowest first
//! - **Scoped recovery**: a failure is contained by the nearest
//!   [`ErrorBoundary`](crate::ErrorBoundary)

mod boundary;
mod commit;
mod effects;
mod mount;
mod render;
mod work;

pub use mount::{render, render_with_config, Root, RootConfig};
