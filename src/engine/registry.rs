//! Node Store - arena allocation for Nodes.
//!
//! Manages the lifecycle of Node slots:
//! - Generational ids so stale handles never alias a reused slot
//! - Free index pool for O(1) reuse
//! - In-place replacement for Nodes reused across renders
//!
//! ```text
//! insert(A) → #0v0      release(#0v0)      insert(B) → #0v1
//! get(#0v0) → A         get(#0v0) → None   get(#0v0) → None (stale)
//! ```

use crate::types::{NodeFlags, NodeId};
use super::node::Node;

struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// Arena of live Nodes.
#[derive(Default)]
pub struct NodeStore {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a Node and hand out its id.
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.live += 1;

        // Reuse free index or allocate new
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            return NodeId::new(index, entry.generation);
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
    }

    /// The live Node behind `id`. Stale and unmounted ids resolve to `None`.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.entry(id)
            .and_then(|entry| entry.node.as_ref())
            .filter(|node| !node.flags.contains(NodeFlags::UNMOUNTED))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.entry_mut(id)
            .and_then(|entry| entry.node.as_mut())
            .filter(|node| !node.flags.contains(NodeFlags::UNMOUNTED))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Put `node` in place of the Node behind `id`, returning the old one.
    pub fn replace(&mut self, id: NodeId, node: Node) -> Option<Node> {
        let entry = self.entry_mut(id)?;
        entry.node.as_ref()?;
        entry.node.replace(node)
    }

    /// Drop the Node behind `id` and recycle its slot.
    pub fn release(&mut self, id: NodeId) -> Option<Node> {
        let entry = self.entry_mut(id)?;
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Number of live Nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Ids of all live Nodes, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry
                .node
                .as_ref()
                .filter(|node| !node.flags.contains(NodeFlags::UNMOUNTED))
                .map(|_| NodeId::new(index as u32, entry.generation))
        })
    }

    /// Drop every Node (for testing).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.live = 0;
    }
}
