//! Commit phase - replay the work log through the host adapter.
//!
//! Mutations are applied strictly in log order. A failing host call is
//! handed to the nearest boundary of the Node it was made for; mutations of
//! Nodes that disappeared in the meantime are skipped.
//!
//! Host placement is positional. A host instance is attached at the path of
//! child-slot indices between its host parent and itself, and that path is
//! recorded on the Node so it can be detached at the same position later.

use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use crate::element::{attrs_equal, TEXT_TAG};
use crate::engine::NodeKind;
use crate::error::{HostError, ViewError};
use crate::hooks::HookSlot;
use crate::host::HostAdapter;
use crate::types::{HostPosition, NodeFlags, NodeId};
use super::mount::Root;
use super::work::{Mutation, Work};

impl<H: HostAdapter> Root<H> {
    /// Apply a finished pass: host mutations, then layout effects. Passive
    /// effects are kept for the next tick.
    pub(super) fn commit(&mut self, mut work: Work) -> Result<(), ViewError> {
        let mutations = work.take_mutations();
        tracing::debug!(
            mutations = mutations.len(),
            layout = work.layout.len(),
            passive = work.passive.len(),
            "commit"
        );

        for mutation in mutations {
            if let Err(error) = self.apply_mutation(mutation) {
                let failure = self.failure(mutation.node(), ViewError::Host(error));
                self.catch_commit_failure(failure, &mut work)?;
            }
        }

        for effect in mem::take(&mut work.layout) {
            self.run_effect(effect);
        }
        self.passive.append(&mut work.passive);

        for boundary in work.retry {
            self.mark_dirty(boundary);
        }
        Ok(())
    }

    fn apply_mutation(&mut self, mutation: Mutation) -> Result<(), HostError> {
        match mutation {
            Mutation::Create { node } => self.commit_create(node),
            Mutation::Attach { node } => self.commit_attach(node),
            Mutation::Update { node } => self.commit_update(node),
            Mutation::Detach { node } => self.commit_detach(node),
            Mutation::Remove { node, replaced_by } => {
                self.commit_remove(node, replaced_by);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Host tree queries
    // =========================================================================

    /// Host and text Nodes at the top of the subtree at `id`, in order.
    fn top_hosts(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.store.get(current) else { continue };
            if node.kind.is_host() {
                out.push(current);
            } else {
                stack.extend(node.children.iter().rev().flatten().copied());
            }
        }
        out
    }

    /// Host parent instance of `id` and the position of `id` below it.
    fn host_location(&self, id: NodeId) -> Option<(H::Instance, HostPosition)> {
        let mut path = Vec::new();
        let mut cursor = id;
        loop {
            let node = self.store.get(cursor)?;
            path.push(node.position);

            let parent_instance = match node.parent {
                None => Some(self.container.clone()),
                Some(parent) if self.store.get(parent)?.kind.is_host() => {
                    Some(self.instances.get(&parent)?.clone())
                }
                Some(parent) => {
                    cursor = parent;
                    None
                }
            };

            if let Some(instance) = parent_instance {
                path.reverse();
                return Some((instance, HostPosition::new(path)));
            }
        }
    }

    /// Positions held by attached hosts next to the subtree at `id`, below
    /// the same host parent.
    fn occupied_positions(&self, id: NodeId, subtree: &[NodeId]) -> Vec<HostPosition> {
        let mut cursor = self.store.get(id).and_then(|node| node.parent);
        let host_parent = loop {
            match cursor {
                None => break None,
                Some(parent) => {
                    let Some(node) = self.store.get(parent) else { return Vec::new() };
                    if node.kind.is_host() {
                        break Some(parent);
                    }
                    cursor = node.parent;
                }
            }
        };

        let tops: Vec<NodeId> = match host_parent {
            Some(parent) => self
                .store
                .get(parent)
                .map(|node| node.children.iter().flatten().copied().collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter()
                .flat_map(|child| self.top_hosts(child))
                .collect(),
            None => self.root.map(|root| self.top_hosts(root)).unwrap_or_default(),
        };

        tops.into_iter()
            .filter(|host| !subtree.contains(host))
            .filter_map(|host| self.store.get(host).and_then(|node| node.host_position.clone()))
            .collect()
    }

    fn missing_parent(id: NodeId) -> HostError {
        HostError::UnknownInstance(format!("host parent of node {id}"))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn commit_create(&mut self, id: NodeId) -> Result<(), HostError> {
        let Some(node) = self.store.get_mut(id) else { return Ok(()) };
        let tag: Rc<str> = match &node.kind {
            NodeKind::Host(tag) => tag.clone(),
            NodeKind::Text => Rc::from(TEXT_TAG),
            _ => {
                node.flags.insert(NodeFlags::MOUNTED);
                return Ok(());
            }
        };
        let props = node.props.clone();

        let instance = self.host.create_instance(&tag, &props, id)?;
        tracing::trace!(node = %id, %tag, "create instance");

        if let Some(node) = self.store.get_mut(id) {
            node.flags.insert(NodeFlags::MOUNTED);
            node.committed_props = Some(props);
        }
        self.instances.insert(id, instance);
        Ok(())
    }

    fn commit_attach(&mut self, id: NodeId) -> Result<(), HostError> {
        for host in self.top_hosts(id) {
            let attached = self.store.get(host).is_none_or(|node| node.host_position.is_some());
            if attached {
                continue;
            }
            let Some(child) = self.instances.get(&host).cloned() else { continue };
            let (parent, position) = self.host_location(host).ok_or_else(|| Self::missing_parent(host))?;

            self.host.append_child(&parent, &child, &position)?;
            tracing::trace!(node = %host, %position, "attach");

            if let Some(node) = self.store.get_mut(host) {
                node.host_position = Some(position);
            }
        }
        Ok(())
    }

    fn commit_update(&mut self, id: NodeId) -> Result<(), HostError> {
        let Some(node) = self.store.get(id) else { return Ok(()) };
        let Some(old) = &node.committed_props else { return Ok(()) };
        if attrs_equal(old, &node.props) {
            return Ok(());
        }
        let Some(instance) = self.instances.get(&id).cloned() else { return Ok(()) };

        let old = old.clone();
        let new = node.props.clone();
        let position = match &node.host_position {
            Some(position) => position.clone(),
            None => self.host_location(id).map(|(_, p)| p).unwrap_or_default(),
        };

        self.host.commit_update(&instance, &old, &new, &position)?;
        tracing::trace!(node = %id, %position, "update");

        if let Some(node) = self.store.get_mut(id) {
            node.committed_props = Some(new);
        }
        Ok(())
    }

    fn commit_detach(&mut self, id: NodeId) -> Result<(), HostError> {
        for host in self.top_hosts(id) {
            let Some(position) = self.store.get(host).and_then(|node| node.host_position.clone()) else {
                continue;
            };
            let Some(child) = self.instances.get(&host).cloned() else { continue };
            let (parent, _) = self.host_location(host).ok_or_else(|| Self::missing_parent(host))?;

            self.host.remove_child(&parent, &child, &position)?;
            tracing::trace!(node = %host, %position, "detach");

            if let Some(node) = self.store.get_mut(host) {
                node.host_position = None;
            }
        }
        Ok(())
    }

    /// Tear down the subtree at `id`: effect cleanups (descendants first),
    /// host detach of its top-most instances, release of every Node.
    ///
    /// Host errors are logged and the teardown continues.
    pub(super) fn commit_remove(&mut self, id: NodeId, replaced_by: Option<NodeId>) {
        let subtree = self.subtree(id);
        if subtree.is_empty() {
            return;
        }

        for node in subtree.iter().rev() {
            self.run_cleanups(*node);
        }

        // Positions the replacement takes over are swapped in place by the
        // adapter when it attaches; so are positions a moved sibling already
        // took.
        let mut taken: HashSet<HostPosition> = replaced_by
            .map(|next| {
                self.top_hosts(next)
                    .into_iter()
                    .filter_map(|host| self.host_location(host).map(|(_, position)| position))
                    .collect()
            })
            .unwrap_or_default();
        taken.extend(self.occupied_positions(id, &subtree));

        for host in self.top_hosts(id) {
            let Some(position) = self.store.get(host).and_then(|node| node.host_position.clone()) else {
                continue;
            };
            if taken.contains(&position) {
                tracing::trace!(node = %host, %position, "replaced in place");
                continue;
            }
            let Some(child) = self.instances.get(&host).cloned() else { continue };
            let Some((parent, _)) = self.host_location(host) else {
                tracing::warn!(node = %host, "no host parent during teardown");
                continue;
            };

            match self.host.remove_child(&parent, &child, &position) {
                Ok(()) => tracing::trace!(node = %host, %position, "remove"),
                Err(error) => tracing::warn!(node = %host, %position, %error, "host error during teardown"),
            }
        }

        for node in subtree {
            if let Some(live) = self.store.get_mut(node) {
                live.unmount();
            }
            self.store.release(node);
            self.instances.remove(&node);
        }
    }

    fn run_cleanups(&mut self, id: NodeId) {
        let Some(node) = self.store.get_mut(id) else { return };
        for slot in node.hooks.iter_mut().filter_map(HookSlot::effect_mut) {
            slot.run_cleanup();
        }
    }
}
