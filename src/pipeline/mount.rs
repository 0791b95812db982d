//! Mount API - root lifecycle.
//!
//! This module provides the entry point for rendering a description tree
//! into a host container and the [`Root`] handle that drives it afterwards.
//!
//! # Example
//!
//! ```ignore
//! use spark_view::{render, MemoryHost};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//!
//! // Initial render: commit + layout effects
//! let mut root = render(app.element(Props::new()), host, container)?;
//!
//! // Option 1: Settle everything
//! root.run_until_idle()?;
//!
//! // Option 2: Tick manually in your own loop
//! while root.tick()? {
//!     // Your logic here
//! }
//!
//! // Clean up: every cleanup runs, the host tree is emptied
//! let host = root.unmount();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::element::Element;
use crate::engine::{Node, NodeStore};
use crate::error::ViewError;
use crate::hooks::{PendingEffect, UpdateQueue};
use crate::host::HostAdapter;
use crate::types::NodeId;
use super::work::Work;

// =============================================================================
// Root Config
// =============================================================================

/// Tunables of a [`Root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    /// Upper bound of ticks for [`Root::run_until_idle`].
    pub max_ticks: usize,
    /// Reject renders that call a different number of hooks than before.
    pub validate_hook_count: bool,
    /// Run pending passive effects before a new render pass.
    pub flush_passive_before_render: bool,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            max_ticks: 64,
            validate_hook_count: cfg!(debug_assertions),
            flush_passive_before_render: true,
        }
    }
}

impl RootConfig {
    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_hook_count_validation(mut self, enabled: bool) -> Self {
        self.validate_hook_count = enabled;
        self
    }

    pub fn with_passive_flush_before_render(mut self, enabled: bool) -> Self {
        self.flush_passive_before_render = enabled;
        self
    }
}

// =============================================================================
// Root
// =============================================================================

/// A rendered tree bound to a host container.
///
/// Owns the Node store, the host adapter and the update queue every setter
/// of the tree writes into.
pub struct Root<H: HostAdapter> {
    pub(super) host: H,
    pub(super) container: H::Instance,
    pub(super) config: RootConfig,
    pub(super) store: NodeStore,
    pub(super) instances: HashMap<NodeId, H::Instance>,
    pub(super) root: Option<NodeId>,
    pub(super) queue: Rc<RefCell<UpdateQueue>>,
    pub(super) dirty: Vec<NodeId>,
    pub(super) passive: Vec<PendingEffect>,
}

/// Render `element` into `container` with the default [`RootConfig`].
///
/// Commits the tree and runs layout effects before returning. Passive
/// effects wait for the first [`Root::tick`].
pub fn render<H: HostAdapter>(
    element: impl Into<Element>,
    host: H,
    container: H::Instance,
) -> Result<Root<H>, ViewError> {
    render_with_config(element, host, container, RootConfig::default())
}

/// Like [`render`], with an explicit configuration.
pub fn render_with_config<H: HostAdapter>(
    element: impl Into<Element>,
    host: H,
    container: H::Instance,
    config: RootConfig,
) -> Result<Root<H>, ViewError> {
    let mut root = Root::new(host, container, config);
    root.render(element)?;
    Ok(root)
}

impl<H: HostAdapter> Root<H> {
    /// An empty root. Nothing is rendered until [`render`](Self::render).
    pub fn new(host: H, container: H::Instance, config: RootConfig) -> Self {
        Self {
            host,
            container,
            config,
            store: NodeStore::new(),
            instances: HashMap::new(),
            root: None,
            queue: Rc::new(RefCell::new(UpdateQueue::default())),
            dirty: Vec::new(),
            passive: Vec::new(),
        }
    }

    /// Reconcile the tree against a new root description and commit.
    pub fn render(&mut self, element: impl Into<Element>) -> Result<(), ViewError> {
        let element = element.into();
        tracing::debug!(root = %element.display_name(), "render");

        if self.config.flush_passive_before_render {
            self.flush_passive_effects();
        }
        self.apply_updates();

        let mut work = Work::default();
        if let Err(failure) = self.reconcile_root(&element, &mut work) {
            return Err(self.fail(failure, work));
        }
        if let Err(failure) = self.render_dirty(&mut work) {
            return Err(self.fail(failure, work));
        }
        self.commit(work)
    }

    /// Run one update cycle.
    ///
    /// Flushes passive effects left by the previous commit, applies queued
    /// state updates and re-renders the affected subtrees. Returns whether
    /// anything happened.
    pub fn tick(&mut self) -> Result<bool, ViewError> {
        let flushed = self.flush_passive_effects();
        let updated = self.apply_updates();

        if self.dirty.is_empty() {
            return Ok(flushed > 0 || updated > 0);
        }

        tracing::debug!(dirty = self.dirty.len(), "tick");
        let mut work = Work::default();
        if let Err(failure) = self.render_dirty(&mut work) {
            return Err(self.fail(failure, work));
        }
        self.commit(work)?;
        Ok(true)
    }

    /// Tick until nothing is pending.
    ///
    /// Fails with [`ViewError::UpdateLimit`] when updates keep scheduling
    /// more updates past [`RootConfig::max_ticks`].
    pub fn run_until_idle(&mut self) -> Result<usize, ViewError> {
        let mut ticks = 0;
        while self.tick()? {
            ticks += 1;
            if ticks >= self.config.max_ticks && self.has_pending_work() {
                tracing::warn!(ticks, "updates did not settle");
                return Err(ViewError::UpdateLimit { ticks });
            }
        }
        Ok(ticks)
    }

    /// Whether a tick would do anything.
    pub fn has_pending_work(&self) -> bool {
        !self.passive.is_empty() || !self.queue.borrow().is_empty() || !self.dirty.is_empty()
    }

    /// Tear the tree down and hand the host back.
    ///
    /// Every cleanup runs; pending passive effects are dropped.
    pub fn unmount(mut self) -> H {
        tracing::debug!(nodes = self.store.len(), "unmount");
        self.passive.clear();
        self.teardown();
        self.queue.borrow_mut().drain();
        let Root { host, .. } = self;
        host
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn container(&self) -> &H::Instance {
        &self.container
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    /// The Node rendered for the root description.
    pub fn root_node(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    /// Number of live Nodes.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    /// Host instance created for a host or text Node.
    pub fn instance(&self, id: NodeId) -> Option<&H::Instance> {
        self.instances.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = RootConfig::default()
            .with_max_ticks(3)
            .with_hook_count_validation(true)
            .with_passive_flush_before_render(false);

        assert_eq!(config.max_ticks, 3);
        assert!(config.validate_hook_count);
        assert!(!config.flush_passive_before_render);
    }

    #[test]
    fn test_default_config() {
        let config = RootConfig::default();
        assert_eq!(config.max_ticks, 64);
        assert!(config.flush_passive_before_render);
        assert_eq!(config.validate_hook_count, cfg!(debug_assertions));
    }
}
