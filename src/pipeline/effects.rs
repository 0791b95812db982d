//! Effect flushing and update application.
//!
//! Both run between render passes. Updates target a hook slot of a live
//! Node; an update whose Node has been removed is dropped.

use std::mem;

use crate::engine::NodeKind;
use crate::hooks::{HookSlot, PendingEffect, Update};
use crate::host::HostAdapter;
use crate::primitives::BoundaryState;
use crate::types::{NodeFlags, NodeId};
use super::mount::Root;

impl<H: HostAdapter> Root<H> {
    /// Run one committed effect: the previous cleanup first, then the body.
    pub(super) fn run_effect(&mut self, pending: PendingEffect) {
        let Some(node) = self.store.get_mut(pending.node) else { return };
        if node.flags.contains(NodeFlags::DETACHED) {
            return;
        }
        let Some(slot) = node.hook_mut(pending.slot).and_then(HookSlot::effect_mut) else {
            tracing::warn!(node = %pending.node, slot = pending.slot, "effect slot vanished");
            return;
        };
        slot.run_cleanup();

        // The body may schedule updates; it never reaches back into the store.
        let cleanup = (pending.effect)();
        if let Some(slot) = self
            .store
            .get_mut(pending.node)
            .and_then(|node| node.hook_mut(pending.slot))
            .and_then(HookSlot::effect_mut)
        {
            slot.cleanup = cleanup;
        }
    }

    /// Run every passive effect left by earlier commits, in commit order.
    ///
    /// Returns how many ran.
    pub fn flush_passive_effects(&mut self) -> usize {
        let pending = mem::take(&mut self.passive);
        let count = pending.len();
        for effect in pending {
            self.run_effect(effect);
        }
        if count > 0 {
            tracing::trace!(count, "flushed passive effects");
        }
        count
    }

    /// Apply every queued update. Returns how many changed something.
    pub(super) fn apply_updates(&mut self) -> usize {
        let updates = self.queue.borrow_mut().drain();
        let mut applied = 0;

        for update in updates {
            tracing::trace!(node = %update.node(), "apply update");
            match update {
                Update::State { node, slot, apply } => {
                    let Some(live) = self.store.get_mut(node) else {
                        tracing::debug!(%node, "dropping update for removed node");
                        continue;
                    };
                    if live.flags.contains(NodeFlags::DETACHED) {
                        continue;
                    }
                    let Some(HookSlot::State(value)) = live.hook_mut(slot) else {
                        tracing::warn!(%node, slot, "update targets a slot that is not state");
                        continue;
                    };
                    if apply(value.as_mut()) {
                        self.mark_dirty(node);
                        applied += 1;
                    }
                }
                Update::Retry { node } => {
                    let Some(live) = self.store.get_mut(node) else { continue };
                    if !matches!(live.kind, NodeKind::ErrorBoundary(_)) || live.flags.contains(NodeFlags::DETACHED) {
                        continue;
                    }
                    if live.boundary == BoundaryState::Caught {
                        live.boundary = BoundaryState::Recovering;
                    }
                    self.mark_dirty(node);
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Schedule `id` for the next scoped render.
    pub(super) fn mark_dirty(&mut self, id: NodeId) {
        let Some(node) = self.store.get_mut(id) else { return };
        if node.flags.contains(NodeFlags::DIRTY) {
            return;
        }
        node.flags.insert(NodeFlags::DIRTY);
        self.dirty.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::element::{Element, Props};
    use crate::hooks::{reset_render_stack, use_state, SetState};
    use crate::host::MemoryHost;
    use crate::pipeline::RootConfig;
    use crate::primitives::Component;

    type Slot = Rc<RefCell<Option<SetState<i64>>>>;

    fn setup() -> Root<MemoryHost> {
        reset_render_stack();
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        Root::new(host, container, RootConfig::default())
    }

    fn counter(slot: &Slot) -> Component {
        let slot = slot.clone();
        Component::new("Counter", move |_props: &Props| {
            let (n, set_n) = use_state(0i64)?;
            *slot.borrow_mut() = Some(set_n);
            Ok(Element::text(n.to_string()))
        })
    }

    #[test]
    fn test_node_marked_dirty_once() {
        let mut root = setup();
        let slot = Slot::default();
        root.render(counter(&slot).element(Props::new())).expect("render");

        let set = slot.borrow().clone().expect("rendered");
        set.set(1);
        set.set(2);

        assert_eq!(root.apply_updates(), 2);
        assert_eq!(root.dirty.len(), 1);
    }

    #[test]
    fn test_updates_for_removed_nodes_are_dropped() {
        let mut root = setup();
        let slot = Slot::default();
        root.render(counter(&slot).element(Props::new())).expect("render");

        let set = slot.borrow().clone().expect("rendered");
        root.render(Element::Empty).expect("render");
        set.set(5);

        assert_eq!(root.apply_updates(), 0);
        assert!(root.dirty.is_empty());
        assert!(root.root_node().is_none());
    }

    #[test]
    fn test_flush_without_pending_effects() {
        let mut root = setup();
        assert_eq!(root.flush_passive_effects(), 0);
        assert!(!root.has_pending_work());
    }
}
