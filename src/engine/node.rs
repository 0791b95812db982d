//! Node - the persistent record of one rendered instance.
//!
//! A Node outlives the descriptions that produce it. Every render builds a
//! fresh Node value from the new description and moves the hook slots and
//! child slots of its predecessor onto it ([`Node::replicate`]), so the
//! instance keeps its identity while its props change.

use std::any::Any;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::context::ContextId;
use crate::element::{Element, Props, TEXT_VALUE};
use crate::hooks::{HookKind, HookSlot};
use crate::primitives::{BoundaryState, Component, ErrorHandler};
use crate::types::{HostPosition, Key, NodeFlags, NodeId};

// =============================================================================
// Node Kind
// =============================================================================

/// What produced a Node.
#[derive(Clone)]
pub enum NodeKind {
    Host(Rc<str>),
    Text,
    Component(Component),
    Fragment,
    Provider {
        context: ContextId,
        name: Rc<str>,
        value: Rc<dyn Any>,
    },
    ErrorBoundary(ErrorHandler),
}

impl NodeKind {
    /// Whether a Node of this kind can be reused for `element`.
    ///
    /// Props never matter here, only what kind of thing sits at the position.
    pub fn accepts(&self, element: &Element) -> bool {
        match (self, element) {
            (NodeKind::Host(tag), Element::Host(host)) => *tag == host.tag,
            (NodeKind::Text, Element::Text(_)) => true,
            (NodeKind::Component(component), Element::Component(c)) => *component == c.component,
            (NodeKind::Fragment, Element::Fragment(_)) => true,
            (NodeKind::Provider { context, .. }, Element::Provider(p)) => *context == p.context,
            (NodeKind::ErrorBoundary(_), Element::ErrorBoundary(_)) => true,
            _ => false,
        }
    }

    /// Kinds backed by a host instance.
    pub fn is_host(&self) -> bool {
        matches!(self, NodeKind::Host(_) | NodeKind::Text)
    }

    pub fn display_name(&self) -> String {
        match self {
            NodeKind::Host(tag) => tag.to_string(),
            NodeKind::Text => "#text".to_string(),
            NodeKind::Component(c) => c.name().to_string(),
            NodeKind::Fragment => "Fragment".to_string(),
            NodeKind::Provider { name, .. } => format!("{name}.Provider"),
            NodeKind::ErrorBoundary(_) => "ErrorBoundary".to_string(),
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Component(c) => write!(f, "Component({})", c.name()),
            NodeKind::Provider { context, name, .. } => write!(f, "Provider({name}, {context:?})"),
            other => f.write_str(&other.display_name()),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) key: Option<Key>,
    /// Props of the latest render, child descriptions included.
    pub(crate) props: Props,
    /// Props last pushed to the host instance.
    pub(crate) committed_props: Option<Props>,
    pub(crate) hooks: Vec<HookSlot>,
    pub(crate) children: Vec<Option<NodeId>>,
    pub(crate) parent: Option<NodeId>,
    /// Index among the parent's child slots.
    pub(crate) position: usize,
    pub(crate) depth: usize,
    /// Position recorded when the host instance was last attached.
    pub(crate) host_position: Option<HostPosition>,
    pub(crate) flags: NodeFlags,
    pub(crate) boundary: BoundaryState,
}

impl Node {
    /// Build an unmounted Node for a description. `Empty` has no Node.
    pub fn from_element(element: &Element) -> Option<Node> {
        let (kind, key, props) = match element {
            Element::Empty => return None,
            Element::Text(text) => (
                NodeKind::Text,
                None,
                Props::new().with(TEXT_VALUE, text.clone()),
            ),
            Element::Host(host) => (
                NodeKind::Host(host.tag.clone()),
                host.key.clone(),
                host.props.clone(),
            ),
            Element::Component(c) => (
                NodeKind::Component(c.component.clone()),
                c.key.clone(),
                c.props.clone(),
            ),
            Element::Fragment(f) => (
                NodeKind::Fragment,
                f.key.clone(),
                Props::new().with_children(element.child_descriptions().iter().cloned()),
            ),
            Element::Provider(p) => (
                NodeKind::Provider {
                    context: p.context,
                    name: p.name.clone(),
                    value: p.value.clone(),
                },
                None,
                Props::new().with_children(element.child_descriptions().iter().cloned()),
            ),
            Element::ErrorBoundary(b) => (
                NodeKind::ErrorBoundary(b.handler.clone()),
                b.key.clone(),
                Props::new().with_children(element.child_descriptions().iter().cloned()),
            ),
        };

        Some(Node {
            kind,
            key,
            props,
            committed_props: None,
            hooks: Vec::new(),
            children: Vec::new(),
            parent: None,
            position: 0,
            depth: 0,
            host_position: None,
            flags: NodeFlags::NONE,
            boundary: BoundaryState::Normal,
        })
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn host_position(&self) -> Option<&HostPosition> {
        self.host_position.as_ref()
    }

    pub fn boundary_state(&self) -> BoundaryState {
        self.boundary
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_mounted(&self) -> bool {
        self.flags.contains(NodeFlags::MOUNTED) && !self.flags.contains(NodeFlags::UNMOUNTED)
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    /// Kind of the hook slot at `index`.
    pub fn hook_kind(&self, index: usize) -> Option<HookKind> {
        self.hooks.get(index).map(HookSlot::kind)
    }

    pub(crate) fn hook_mut(&mut self, index: usize) -> Option<&mut HookSlot> {
        self.hooks.get_mut(index)
    }

    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied().flatten()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn set_child(&mut self, index: usize, child: NodeId) {
        if index >= self.children.len() {
            self.children.resize(index + 1, None);
        }
        self.children[index] = Some(child);
    }

    pub(crate) fn clear_child(&mut self, index: usize) -> Option<NodeId> {
        self.children.get_mut(index).and_then(Option::take)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Take over the instance state of `previous`.
    ///
    /// Hook slots, child slots, tree linkage, host bookkeeping, lifecycle
    /// flags and boundary state move over; kind, key and props stay those of
    /// the new description.
    pub(crate) fn replicate(&mut self, previous: &mut Node) {
        self.hooks = mem::take(&mut previous.hooks);
        self.children = mem::take(&mut previous.children);
        self.parent = previous.parent;
        self.position = previous.position;
        self.depth = previous.depth;
        self.host_position = previous.host_position.take();
        self.committed_props = previous.committed_props.take();
        self.flags = previous.flags;
        self.boundary = previous.boundary;
    }

    /// Link the Node below `parent` at child slot `position`.
    pub(crate) fn mount(&mut self, parent: Option<NodeId>, position: usize, depth: usize) {
        self.parent = parent;
        self.position = position;
        self.depth = depth;
    }

    /// Mark the Node torn down. Irreversible.
    pub(crate) fn unmount(&mut self) {
        self.flags.insert(NodeFlags::UNMOUNTED);
        self.flags.remove(NodeFlags::DIRTY);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .field("position", &self.position)
            .field("host_position", &self.host_position)
            .field("flags", &self.flags)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::primitives::ErrorBoundary;

    #[test]
    fn test_kind_compatibility() {
        let item = Component::new("Item", |_| Ok(Element::Empty));
        let other = Component::new("Item", |_| Ok(Element::Empty));
        let theme = Context::new("Theme", 0);

        let node = Node::from_element(&item.element(Props::new())).expect("node");
        assert!(node.kind.accepts(&item.element(Props::new().with("x", 1))));
        assert!(!node.kind.accepts(&other.element(Props::new())));

        let div = Node::from_element(&Element::host("div").into()).expect("node");
        assert!(div.kind.accepts(&Element::host("div").attr("id", "a").into()));
        assert!(!div.kind.accepts(&Element::host("span").into()));
        assert!(!div.kind.accepts(&Element::text("div")));

        let provider = Node::from_element(&theme.provider(1, vec![])).expect("node");
        assert!(provider.kind.accepts(&theme.provider(2, vec![])));
        assert!(!provider.kind.accepts(&Context::new("Theme", 0).provider(1, vec![])));

        let boundary = Node::from_element(&ErrorBoundary::new(|_, _| {}).into()).expect("node");
        assert!(boundary.kind.accepts(&ErrorBoundary::new(|_, _| {}).into()));
    }

    #[test]
    fn test_empty_has_no_node() {
        assert!(Node::from_element(&Element::Empty).is_none());
    }

    #[test]
    fn test_text_props() {
        let node = Node::from_element(&Element::text("hello")).expect("node");
        assert_eq!(node.props.str(TEXT_VALUE), Some("hello"));
        assert!(node.kind.is_host());
    }

    #[test]
    fn test_container_children_become_props() {
        let fragment = Element::keyed_fragment("rows", vec![Element::text("a"), Element::Empty]);
        let node = Node::from_element(&fragment).expect("node");
        assert_eq!(node.key, Some(Key::from("rows")));
        assert_eq!(node.props.children().len(), 2);

        let theme = Context::new("Theme", 0);
        let provider = Node::from_element(&theme.provider(1, vec![Element::text("x")])).expect("node");
        assert_eq!(provider.props.children().len(), 1);
    }

    #[test]
    fn test_replicate_moves_slots() {
        let mut previous = Node::from_element(&Element::host("ul").into()).expect("node");
        previous.mount(Some(NodeId::new(0, 0)), 3, 1);
        previous.set_child(1, NodeId::new(7, 0));
        previous.hooks.push(HookSlot::Ref(Rc::new(5u8)));
        previous.flags = NodeFlags::MOUNTED | NodeFlags::RENDERED;
        previous.host_position = Some(HostPosition::index(3));

        let mut next = Node::from_element(&Element::host("ul").attr("class", "x").into()).expect("node");
        next.replicate(&mut previous);

        assert_eq!(next.child_count(), 2);
        assert_eq!(next.child(0), None);
        assert_eq!(next.child(1), Some(NodeId::new(7, 0)));
        assert_eq!(next.hook_kind(0), Some(HookKind::Ref));
        assert_eq!(next.parent(), Some(NodeId::new(0, 0)));
        assert_eq!(next.position(), 3);
        assert_eq!(next.host_position(), Some(&HostPosition::index(3)));
        assert_eq!(next.props().str("class"), Some("x"));
        assert!(next.is_mounted());

        assert!(previous.hooks.is_empty());
        assert_eq!(previous.child_count(), 0);
    }

    #[test]
    fn test_unmount_is_sticky() {
        let mut node = Node::from_element(&Element::text("x")).expect("node");
        node.flags = NodeFlags::MOUNTED | NodeFlags::DIRTY;
        node.unmount();

        assert!(!node.is_mounted());
        assert!(!node.flags().contains(NodeFlags::DIRTY));
        assert_eq!(node.clear_child(0), None);
    }
}
