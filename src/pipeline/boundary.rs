//! Failure handling - boundary capture and root teardown.
//!
//! A render failure unwinds the work log to the checkpoint taken when the
//! catching boundary (or the scoped pass) started. Nodes created since then
//! never reached the host and are released on the spot. Nodes that did reach
//! the host are removed through the regular commit path so their cleanups
//! run and their host instances are detached.
//!
//! ```text
//! Normal ──failure──▶ Caught ──handler scheduled updates──▶ Recovering
//!    ▲                                                          │
//!    └──────────────────── next tick, clean render ◀────────────┘
//! ```

use std::mem;
use std::rc::Rc;

use crate::engine::NodeKind;
use crate::error::{RenderFailure, ViewError};
use crate::host::HostAdapter;
use crate::primitives::{BoundaryHandle, BoundaryState};
use crate::types::NodeId;
use super::mount::Root;
use super::render::Failed;
use super::work::{Checkpoint, Mutation, Work};

impl<H: HostAdapter> Root<H> {
    /// Undo everything recorded after `checkpoint`.
    fn unwind(&mut self, checkpoint: Checkpoint, work: &mut Work) {
        let dropped = work.rollback(checkpoint);

        let mut removed = Vec::new();
        for mutation in &dropped {
            match *mutation {
                Mutation::Create { node } => self.release_uncommitted(node),
                Mutation::Remove { node, .. } => removed.push(node),
                _ => {}
            }
        }

        // Removals decided before the failure still have to happen.
        for node in removed {
            self.schedule_remove(node, None, work);
        }
    }

    fn release_uncommitted(&mut self, id: NodeId) {
        if let Some(node) = self.store.get_mut(id) {
            node.unmount();
        }
        self.store.release(id);
        self.instances.remove(&id);
    }

    /// Capture a render failure at `boundary`.
    pub(super) fn catch(&mut self, boundary: NodeId, failure: Failed, checkpoint: Checkpoint, work: &mut Work) {
        tracing::warn!(%boundary, error = %failure, "render failure caught by boundary");
        self.unwind(checkpoint, work);

        let children = self
            .store
            .get_mut(boundary)
            .map(|node| {
                node.boundary = BoundaryState::Caught;
                mem::take(&mut node.children)
            })
            .unwrap_or_default();
        for child in children.into_iter().flatten() {
            self.schedule_remove(child, None, work);
        }

        self.notify_boundary(boundary, *failure, work);
    }

    /// Capture a host failure raised while committing.
    ///
    /// The commit is already under way, so the boundary's subtree is torn
    /// down immediately instead of through the log.
    pub(super) fn catch_commit_failure(&mut self, failure: Failed, work: &mut Work) -> Result<(), ViewError> {
        let Some(boundary) = self.nearest_boundary(failure.node) else {
            return Err(self.abort(failure));
        };
        tracing::warn!(%boundary, error = %failure, "commit failure caught by boundary");

        let children = self
            .store
            .get_mut(boundary)
            .map(|node| {
                node.boundary = BoundaryState::Caught;
                mem::take(&mut node.children)
            })
            .unwrap_or_default();
        for child in children.into_iter().flatten() {
            self.commit_remove(child, None);
        }

        self.notify_boundary(boundary, *failure, work);
        Ok(())
    }

    /// Hand the failure to the boundary's handler.
    ///
    /// Any update the handler schedules moves the boundary to `Recovering`
    /// and re-renders it once the current pass is committed.
    fn notify_boundary(&mut self, boundary: NodeId, failure: RenderFailure, work: &mut Work) {
        let Some(NodeKind::ErrorBoundary(handler)) = self.store.get(boundary).map(|node| node.kind.clone()) else {
            return;
        };

        let before = self.queue.borrow().len();
        let handle = BoundaryHandle::new(boundary, Rc::downgrade(&self.queue));
        handler(&failure, &handle);

        if self.queue.borrow().len() > before {
            if let Some(node) = self.store.get_mut(boundary) {
                node.boundary = BoundaryState::Recovering;
            }
            work.retry.push(boundary);
        }
    }

    /// A failure nobody caught during the render phase: drop the pass and
    /// tear down the whole tree.
    pub(super) fn fail(&mut self, failure: Failed, mut work: Work) -> ViewError {
        self.unwind(Checkpoint::default(), &mut work);
        if let Some(root) = self.root.take() {
            self.schedule_remove(root, None, &mut work);
        }

        for mutation in work.take_mutations() {
            if let Mutation::Remove { node, .. } = mutation {
                self.commit_remove(node, None);
            }
        }
        self.dirty.clear();
        self.escalate(failure)
    }

    /// A failure nobody caught during commit.
    fn abort(&mut self, failure: Failed) -> ViewError {
        self.teardown();
        self.escalate(failure)
    }

    fn escalate(&self, failure: Failed) -> ViewError {
        tracing::error!(error = %failure, "uncaught render failure, tree torn down");
        if failure.error.is_usage_error() {
            let RenderFailure { error, .. } = *failure;
            error
        } else {
            ViewError::Uncaught(failure)
        }
    }

    /// Remove the whole tree.
    pub(super) fn teardown(&mut self) {
        if let Some(root) = self.root.take() {
            self.commit_remove(root, None);
        }
        self.dirty.clear();
    }
}
