//! Work log - what a render pass wants the commit to do.
//!
//! The render phase never touches the host. It records mutations and effects
//! in order; the commit phase replays them through the adapter. Because the
//! log is append-only, a failed subtree is undone by truncating it back to a
//! [`Checkpoint`].

use std::mem;

use crate::hooks::{HookKind, PendingEffect};
use crate::types::NodeId;

/// One host-level change, applied in log order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    /// Create the host instance of a new Node. Recorded on entry.
    Create { node: NodeId },
    /// Attach the Node's unattached top-most host instances. Recorded on exit.
    Attach { node: NodeId },
    /// Push changed attributes to the host. Recorded on exit.
    Update { node: NodeId },
    /// Detach a keyed Node that moves among its siblings.
    Detach { node: NodeId },
    /// Tear down a subtree: cleanups, host detach, release.
    Remove {
        node: NodeId,
        replaced_by: Option<NodeId>,
    },
}

impl Mutation {
    pub(crate) fn node(&self) -> NodeId {
        match self {
            Mutation::Create { node }
            | Mutation::Attach { node }
            | Mutation::Update { node }
            | Mutation::Detach { node }
            | Mutation::Remove { node, .. } => *node,
        }
    }
}

/// Log lengths at some point of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    mutations: usize,
    layout: usize,
    passive: usize,
}

/// Everything recorded by one render pass.
#[derive(Debug, Default)]
pub(crate) struct Work {
    pub(crate) mutations: Vec<Mutation>,
    pub(crate) layout: Vec<PendingEffect>,
    pub(crate) passive: Vec<PendingEffect>,
    /// Boundaries to re-render once this pass is committed.
    pub(crate) retry: Vec<NodeId>,
}

impl Work {
    pub(crate) fn push(&mut self, mutation: Mutation) {
        tracing::trace!(?mutation, "record");
        self.mutations.push(mutation);
    }

    /// Queue effects of a finished component, split by kind.
    pub(crate) fn push_effects(&mut self, effects: Vec<PendingEffect>) {
        for effect in effects {
            match effect.kind {
                HookKind::LayoutEffect => self.layout.push(effect),
                _ => self.passive.push(effect),
            }
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            mutations: self.mutations.len(),
            layout: self.layout.len(),
            passive: self.passive.len(),
        }
    }

    /// Drop everything recorded after `checkpoint` and return the dropped
    /// mutations.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) -> Vec<Mutation> {
        self.layout.truncate(checkpoint.layout);
        self.passive.truncate(checkpoint.passive);
        self.mutations.split_off(checkpoint.mutations.min(self.mutations.len()))
    }

    pub(crate) fn take_mutations(&mut self) -> Vec<Mutation> {
        mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(kind: HookKind, node: u32) -> PendingEffect {
        PendingEffect {
            kind,
            node: NodeId::new(node, 0),
            slot: 0,
            effect: Box::new(|| None),
        }
    }

    #[test]
    fn test_effects_split_by_kind() {
        let mut work = Work::default();
        work.push_effects(vec![
            effect(HookKind::Effect, 1),
            effect(HookKind::LayoutEffect, 1),
            effect(HookKind::Effect, 2),
        ]);

        assert_eq!(work.layout.len(), 1);
        assert_eq!(work.passive.len(), 2);
    }

    #[test]
    fn test_rollback_truncates_everything() {
        let mut work = Work::default();
        work.push(Mutation::Create { node: NodeId::new(1, 0) });
        work.push_effects(vec![effect(HookKind::Effect, 1)]);

        let checkpoint = work.checkpoint();
        work.push(Mutation::Create { node: NodeId::new(2, 0) });
        work.push(Mutation::Attach { node: NodeId::new(2, 0) });
        work.push_effects(vec![effect(HookKind::LayoutEffect, 2), effect(HookKind::Effect, 2)]);

        let dropped = work.rollback(checkpoint);
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0], Mutation::Create { node: NodeId::new(2, 0) });
        assert_eq!(work.mutations.len(), 1);
        assert!(work.layout.is_empty());
        assert_eq!(work.passive.len(), 1);
        assert_eq!(work.checkpoint(), checkpoint);
    }
}
