//! Render phase - diff descriptions against the Node tree.
//!
//! Walks the tree depth-first. Every position pairs a new description with
//! the old Node there (matched by key, else by index) and either reuses it,
//! replaces it or creates a Node. Nothing reaches the host here: the phase
//! only records [`Mutation`]s and effects into the pass's [`Work`].
//!
//! ```text
//! old: [A, B, C]        new: [A, <empty>, C, D]
//!
//! A → reuse (Update)
//! B → removed (Remove)
//! C → reuse (Update)
//! D → Create ... Attach
//! ```
//!
//! Create is recorded when a Node is entered and Attach when it is left, so
//! host instances are assembled bottom-up before they are attached.

use std::collections::{HashMap, HashSet};
use std::mem;
use std::rc::Rc;

use crate::context::{push_provider, ProviderGuard};
use crate::element::{props_equal, Element};
use crate::engine::{Node, NodeKind};
use crate::error::{RenderFailure, ViewError};
use crate::hooks::{self, RenderRequest};
use crate::host::HostAdapter;
use crate::primitives::{BoundaryState, Component};
use crate::types::{Key, NodeFlags, NodeId};
use super::mount::Root;
use super::work::{Mutation, Work};

/// Failure travelling up the render phase.
pub(super) type Failed = Box<RenderFailure>;

/// What happens at one child position.
#[derive(Debug, Clone, Copy)]
enum Plan {
    New,
    Reuse { id: NodeId, moved: bool },
    Replace { old: NodeId },
}

impl Plan {
    fn old_id(&self) -> Option<NodeId> {
        match self {
            Plan::New => None,
            Plan::Reuse { id, .. } => Some(*id),
            Plan::Replace { old } => Some(*old),
        }
    }
}

impl<H: HostAdapter> Root<H> {
    // =========================================================================
    // Entry points
    // =========================================================================

    /// Reconcile the root slot against `element`.
    pub(super) fn reconcile_root(&mut self, element: &Element, work: &mut Work) -> Result<(), Failed> {
        self.reconcile_children(None, std::slice::from_ref(element), work)
    }

    /// Re-render every dirty Node, shallowest first.
    pub(super) fn render_dirty(&mut self, work: &mut Work) -> Result<(), Failed> {
        let mut dirty = mem::take(&mut self.dirty);
        dirty.sort_by_key(|id| self.store.get(*id).map_or(0, Node::depth));

        for id in dirty {
            let Some(node) = self.store.get(id) else { continue };
            if node.flags.contains(NodeFlags::DETACHED) || !node.flags.contains(NodeFlags::DIRTY) {
                continue;
            }
            self.render_scoped(id, work)?;
        }
        Ok(())
    }

    /// Re-render one Node's subtree in isolation.
    fn render_scoped(&mut self, id: NodeId, work: &mut Work) -> Result<(), Failed> {
        tracing::debug!(node = %id, "scoped render");
        let checkpoint = work.checkpoint();

        let mut guards = self.restore_providers(id);
        let result = self.render_node(id, work);
        while let Some(guard) = guards.pop() {
            drop(guard);
        }

        match result {
            Ok(()) => Ok(()),
            Err(failure) if failure.error.is_usage_error() => Err(failure),
            Err(failure) => match self.nearest_boundary(id) {
                Some(boundary) => {
                    self.catch(boundary, failure, checkpoint, work);
                    Ok(())
                }
                None => Err(failure),
            },
        }
    }

    /// Push the values of every Provider above `id`, outermost first.
    fn restore_providers(&self, id: NodeId) -> Vec<ProviderGuard> {
        let mut chain = Vec::new();
        let mut cursor = self.store.get(id).and_then(Node::parent);
        while let Some(parent) = cursor {
            let Some(node) = self.store.get(parent) else { break };
            if let NodeKind::Provider { context, value, .. } = &node.kind {
                chain.push((*context, value.clone()));
            }
            cursor = node.parent;
        }

        chain
            .into_iter()
            .rev()
            .map(|(context, value)| push_provider(context, value))
            .collect()
    }

    // =========================================================================
    // Child lists
    // =========================================================================

    fn take_children(&mut self, parent: Option<NodeId>) -> Vec<Option<NodeId>> {
        match parent {
            Some(parent) => self
                .store
                .get_mut(parent)
                .map(|node| mem::take(&mut node.children))
                .unwrap_or_default(),
            None => vec![self.root.take()],
        }
    }

    fn put_children(&mut self, parent: Option<NodeId>, children: Vec<Option<NodeId>>) {
        match parent {
            Some(parent) => {
                let Some(node) = self.store.get_mut(parent) else { return };
                node.children.truncate(children.len());
                node.children.resize(children.len(), None);
                for (index, child) in children.into_iter().enumerate() {
                    match child {
                        Some(child) => node.set_child(index, child),
                        None => {
                            node.clear_child(index);
                        }
                    }
                }
            }
            None => self.root = children.into_iter().flatten().next(),
        }
    }

    /// Diff the child slots of `parent` (the root slot for `None`) against
    /// `descriptions`.
    fn reconcile_children(
        &mut self,
        parent: Option<NodeId>,
        descriptions: &[Element],
        work: &mut Work,
    ) -> Result<(), Failed> {
        let old = self.take_children(parent);
        let depth = parent
            .and_then(|p| self.store.get(p))
            .map_or(0, |node| node.depth + 1);

        // Index old children: by key, else by position.
        let mut keyed: HashMap<Key, (usize, NodeId)> = HashMap::new();
        let mut unkeyed: Vec<Option<NodeId>> = vec![None; old.len()];
        let mut leftovers: Vec<(usize, NodeId)> = Vec::new();

        for (index, id) in old.iter().enumerate() {
            let Some(id) = *id else { continue };
            let Some(node) = self.store.get(id) else { continue };
            match &node.key {
                Some(key) if keyed.contains_key(key) => leftovers.push((index, id)),
                Some(key) => {
                    keyed.insert(key.clone(), (index, id));
                }
                None => unkeyed[index] = Some(id),
            }
        }

        // Pair every description with an old child.
        let mut seen: HashSet<Key> = HashSet::new();
        let mut plans: Vec<(Plan, bool)> = Vec::with_capacity(descriptions.len());

        for (index, description) in descriptions.iter().enumerate() {
            let mut strip_key = false;
            let candidate = match description.key() {
                Some(key) if seen.insert(key.clone()) => keyed.remove(key),
                Some(key) => {
                    tracing::warn!(%key, index, "duplicate key among siblings, matching by position");
                    strip_key = true;
                    unkeyed.get_mut(index).and_then(Option::take).map(|id| (index, id))
                }
                None => unkeyed.get_mut(index).and_then(Option::take).map(|id| (index, id)),
            };

            let plan = match candidate {
                None => Plan::New,
                Some((old_index, id)) if description.is_empty() => {
                    leftovers.push((old_index, id));
                    Plan::New
                }
                Some((old_index, id)) => {
                    let accepts = self
                        .store
                        .get(id)
                        .is_some_and(|node| node.kind.accepts(description));
                    if accepts {
                        Plan::Reuse {
                            id,
                            moved: old_index != index,
                        }
                    } else {
                        Plan::Replace { old: id }
                    }
                }
            };
            plans.push((plan, strip_key));
        }

        leftovers.extend(keyed.into_values());
        leftovers.extend(unkeyed.into_iter().enumerate().filter_map(|(i, id)| id.map(|id| (i, id))));
        leftovers.sort_by_key(|(index, _)| *index);

        // Removals and moves go before any attach of this list.
        for (_, id) in leftovers {
            self.schedule_remove(id, None, work);
        }
        for (plan, _) in &plans {
            if let Plan::Reuse { id, moved: true } = plan {
                work.push(Mutation::Detach { node: *id });
            }
        }

        let mut children = Vec::with_capacity(descriptions.len());
        for (index, description) in descriptions.iter().enumerate() {
            let (plan, strip_key) = plans[index];
            match self.reconcile_slot(parent, index, depth, description, plan, strip_key, work) {
                Ok(child) => children.push(child),
                Err(failure) => {
                    // Keep every old child reachable for the unwind.
                    children.extend(plans[index..].iter().filter_map(|(plan, _)| plan.old_id()).map(Some));
                    self.put_children(parent, children);
                    return Err(failure);
                }
            }
        }

        self.put_children(parent, children);
        Ok(())
    }

    /// Reconcile one child position.
    #[allow(clippy::too_many_arguments)]
    fn reconcile_slot(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        depth: usize,
        description: &Element,
        plan: Plan,
        strip_key: bool,
        work: &mut Work,
    ) -> Result<Option<NodeId>, Failed> {
        let Some(mut node) = Node::from_element(description) else {
            return Ok(None);
        };
        if strip_key {
            node.key = None;
        }
        node.mount(parent, index, depth);

        if let Plan::Reuse { id, moved } = plan {
            if self.memo_hit(id, &node) {
                tracing::trace!(node = %id, "memo hit");
                if let Some(existing) = self.store.get_mut(id) {
                    existing.mount(parent, index, depth);
                }
                if moved {
                    work.push(Mutation::Attach { node: id });
                }
                return Ok(Some(id));
            }

            if let Some(previous) = self.store.get_mut(id) {
                node.replicate(previous);
                node.mount(parent, index, depth);
                let is_host = node.kind.is_host();
                self.store.replace(id, node);

                self.render_node(id, work)?;
                if is_host {
                    work.push(Mutation::Update { node: id });
                }
                if moved {
                    work.push(Mutation::Attach { node: id });
                }
                return Ok(Some(id));
            }
        }

        let id = self.store.insert(node);
        work.push(Mutation::Create { node: id });
        if let Plan::Replace { old } = plan {
            self.schedule_remove(old, Some(id), work);
        }

        self.render_node(id, work)?;
        work.push(Mutation::Attach { node: id });
        Ok(Some(id))
    }

    /// A memoised component with equal props and no pending update.
    fn memo_hit(&self, id: NodeId, next: &Node) -> bool {
        let Some(previous) = self.store.get(id) else { return false };
        match &previous.kind {
            NodeKind::Component(component) => {
                component.is_memo()
                    && previous.flags.contains(NodeFlags::RENDERED)
                    && !previous.flags.contains(NodeFlags::DIRTY)
                    && props_equal(&previous.props, &next.props)
            }
            _ => false,
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Render the children of a Node that is already in the store.
    pub(super) fn render_node(&mut self, id: NodeId, work: &mut Work) -> Result<(), Failed> {
        let Some(node) = self.store.get_mut(id) else { return Ok(()) };
        node.flags.remove(NodeFlags::DIRTY);
        let kind = node.kind.clone();

        match kind {
            NodeKind::Text => Ok(()),
            NodeKind::Host(_) | NodeKind::Fragment => {
                let children = node.props.children().to_vec();
                self.reconcile_children(Some(id), &children, work)
            }
            NodeKind::Provider { context, value, .. } => {
                let children = node.props.children().to_vec();
                let _provided = push_provider(context, value);
                self.reconcile_children(Some(id), &children, work)
            }
            NodeKind::Component(component) => self.render_component(id, &component, work),
            NodeKind::ErrorBoundary(_) => self.render_boundary(id, work),
        }
    }

    fn render_component(&mut self, id: NodeId, component: &Component, work: &mut Work) -> Result<(), Failed> {
        let Some(node) = self.store.get_mut(id) else { return Ok(()) };

        let request = RenderRequest {
            node: id,
            component: Rc::from(component.name()),
            hooks: mem::take(&mut node.hooks),
            first_render: !node.flags.contains(NodeFlags::RENDERED),
            queue: Rc::downgrade(&self.queue),
            validate_count: self.config.validate_hook_count,
        };
        let props = node.props.clone();

        let outcome = hooks::render_component(request, || component.call(&props));

        if let Some(node) = self.store.get_mut(id) {
            node.hooks = outcome.hooks;
            if outcome.result.is_ok() {
                node.flags.insert(NodeFlags::RENDERED);
            }
        }

        let element = outcome.result.map_err(|error| self.failure(id, error))?;
        self.reconcile_children(Some(id), std::slice::from_ref(&element), work)?;
        work.push_effects(outcome.effects);
        Ok(())
    }

    fn render_boundary(&mut self, id: NodeId, work: &mut Work) -> Result<(), Failed> {
        let Some(node) = self.store.get(id) else { return Ok(()) };
        if node.boundary == BoundaryState::Caught {
            return Ok(());
        }
        let children = node.props.children().to_vec();

        let checkpoint = work.checkpoint();
        match self.reconcile_children(Some(id), &children, work) {
            Ok(()) => {
                if let Some(node) = self.store.get_mut(id) {
                    if node.boundary == BoundaryState::Recovering {
                        tracing::debug!(boundary = %id, "boundary recovered");
                    }
                    node.boundary = BoundaryState::Normal;
                }
                Ok(())
            }
            Err(failure) if failure.error.is_usage_error() => Err(failure),
            Err(failure) => {
                self.catch(id, failure, checkpoint, work);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Record the removal of `id` and keep later passes away from its subtree.
    pub(super) fn schedule_remove(&mut self, id: NodeId, replaced_by: Option<NodeId>, work: &mut Work) {
        if !self.store.contains(id) {
            return;
        }
        self.mark_detached(id);
        work.push(Mutation::Remove { node: id, replaced_by });
    }

    pub(super) fn mark_detached(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.store.get_mut(current) {
                node.flags.insert(NodeFlags::DETACHED);
                stack.extend(node.children.iter().flatten().copied());
            }
        }
    }

    /// Live ids of the subtree at `id`, parents before children.
    pub(super) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.store.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().flatten().copied());
            }
        }
        out
    }

    /// Names from the root down to `id`.
    pub(super) fn path_to(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.store.get(current) else { break };
            path.push(node.kind.display_name());
            cursor = node.parent;
        }
        path.reverse();
        path
    }

    pub(super) fn failure(&self, id: NodeId, error: ViewError) -> Failed {
        Box::new(RenderFailure::new(error, id, self.path_to(id)))
    }

    /// Closest ancestor boundary of `id` that can still catch.
    pub(super) fn nearest_boundary(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.store.get(id).and_then(Node::parent);
        while let Some(current) = cursor {
            let node = self.store.get(current)?;
            if matches!(node.kind, NodeKind::ErrorBoundary(_)) && node.boundary != BoundaryState::Caught {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }
}
