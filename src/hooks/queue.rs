//! Update queue shared between a root and the setters it hands out.

use std::any::Any;
use std::mem;

use crate::types::NodeId;

/// Applies a state update to a slot value. Returns true if the value changed.
pub(crate) type ApplyFn = Box<dyn FnOnce(&mut dyn Any) -> bool>;

/// A scheduled change, applied by the root between renders.
pub(crate) enum Update {
    State {
        node: NodeId,
        slot: usize,
        apply: ApplyFn,
    },
    /// Re-render an error boundary's subtree.
    Retry { node: NodeId },
}

impl Update {
    pub(crate) fn node(&self) -> NodeId {
        match self {
            Update::State { node, .. } | Update::Retry { node } => *node,
        }
    }
}

/// FIFO of pending updates.
#[derive(Default)]
pub(crate) struct UpdateQueue {
    updates: Vec<Update>,
}

impl UpdateQueue {
    pub(crate) fn push(&mut self, update: Update) {
        self.updates.push(update);
    }

    pub(crate) fn len(&self) -> usize {
        self.updates.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Take every pending update, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<Update> {
        mem::take(&mut self.updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_is_fifo() {
        let mut queue = UpdateQueue::default();
        queue.push(Update::Retry { node: NodeId::new(1, 0) });
        queue.push(Update::Retry { node: NodeId::new(2, 0) });
        assert_eq!(queue.len(), 2);

        let drained: Vec<NodeId> = queue.drain().iter().map(Update::node).collect();
        assert_eq!(drained, vec![NodeId::new(1, 0), NodeId::new(2, 0)]);
        assert!(queue.is_empty());
    }
}
