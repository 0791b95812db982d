//! MemoryHost - headless host tree.
//!
//! Keeps host nodes in a flat vector and each node's children in a map
//! ordered by [`HostPosition`], which is exactly the positional insertion
//! contract: an equal key replaces, a greater key sorts after. Every adapter
//! call is appended to an operation log so tests can assert on the precise
//! sequence of host mutations.
//!
//! ```ignore
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let root = render(app.element(Props::new()), host, container)?;
//!
//! assert_eq!(root.host().to_markup(container), "<root><p>hi</p></root>");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::element::{Props, TEXT_TAG, TEXT_VALUE};
use crate::error::HostError;
use crate::types::{HostPosition, NodeId};
use super::HostAdapter;

/// Attribute assigned as a direct property instead of an attribute.
const CLASS: &str = "class";

/// Handle to a node of a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(usize);

impl fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// One node of the in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct HostNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// The `class` property.
    pub class_name: Option<String>,
    /// Content of a text node.
    pub text: Option<String>,
    pub children: BTreeMap<HostPosition, HostNodeId>,
    pub parent: Option<HostNodeId>,
    /// The Node that created this instance.
    pub owner: Option<NodeId>,
}

/// A recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    Create {
        id: HostNodeId,
        tag: String,
    },
    /// Inserted at a free position.
    Append {
        parent: HostNodeId,
        child: HostNodeId,
        position: HostPosition,
    },
    /// Took over the position of `old`.
    Replace {
        parent: HostNodeId,
        old: HostNodeId,
        new: HostNodeId,
        position: HostPosition,
    },
    Remove {
        parent: HostNodeId,
        child: HostNodeId,
        position: HostPosition,
    },
    Update {
        id: HostNodeId,
    },
}

/// In-memory [`HostAdapter`].
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
    fail_next: Option<HostError>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root container. Not recorded in the operation log.
    pub fn create_container(&mut self, tag: &str) -> HostNodeId {
        self.alloc(HostNode {
            tag: tag.to_string(),
            ..HostNode::default()
        })
    }

    fn alloc(&mut self, node: HostNode) -> HostNodeId {
        self.nodes.push(node);
        HostNodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: HostNodeId) -> Option<&HostNode> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: HostNodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| HostError::UnknownInstance(id.to_string()))
    }

    /// Children of `id` in rendered order.
    pub fn children(&self, id: HostNodeId) -> Vec<HostNodeId> {
        self.node(id)
            .map(|node| node.children.values().copied().collect())
            .unwrap_or_default()
    }

    /// Recorded positions of the children of `id`, in rendered order.
    pub fn positions(&self, id: HostNodeId) -> Vec<HostPosition> {
        self.node(id)
            .map(|node| node.children.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Make the next adapter call fail with `error`.
    pub fn fail_next(&mut self, error: HostError) {
        self.fail_next = Some(error);
    }

    fn check_failure(&mut self) -> Result<(), HostError> {
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Concatenated text below `id`.
    pub fn text_content(&self, id: HostNodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        match &node.text {
            Some(text) => text.clone(),
            None => node
                .children
                .values()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    /// Serialize the subtree at `id`.
    ///
    /// Text nodes print their content; elements print as
    /// `<tag class="..." attr="...">children</tag>`.
    pub fn to_markup(&self, id: HostNodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: HostNodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };

        if let Some(text) = &node.text {
            out.push_str(text);
            return;
        }

        out.push('<');
        out.push_str(&node.tag);
        if let Some(class) = &node.class_name {
            out.push_str(&format!(" class=\"{class}\""));
        }
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        for child in node.children.values() {
            self.write_markup(*child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }

    fn apply_attributes(node: &mut HostNode, old: Option<&Props>, new: &Props) {
        if node.tag == TEXT_TAG {
            node.text = Some(new.str(TEXT_VALUE).unwrap_or_default().to_string());
            return;
        }

        if let Some(old) = old {
            for (name, _) in old.attrs() {
                if !new.contains(name) {
                    Self::set_attribute(node, name, None);
                }
            }
        }
        for (name, value) in new.attrs() {
            Self::set_attribute(node, name, value.to_attribute());
        }
    }

    fn set_attribute(node: &mut HostNode, name: &str, value: Option<String>) {
        if name == CLASS {
            node.class_name = value;
            return;
        }
        match value {
            Some(value) => {
                node.attributes.insert(name.to_string(), value);
            }
            None => {
                node.attributes.remove(name);
            }
        }
    }

    /// Remove `child` from whatever parent it is attached to.
    fn unlink(&mut self, child: HostNodeId) {
        let Some(parent) = self.node(child).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|_, c| *c != child);
        }
        if let Some(child) = self.nodes.get_mut(child.0) {
            child.parent = None;
        }
    }
}

impl HostAdapter for MemoryHost {
    type Instance = HostNodeId;

    fn create_instance(&mut self, tag: &str, props: &Props, node: NodeId) -> Result<HostNodeId, HostError> {
        self.check_failure()?;

        let mut host_node = HostNode {
            tag: tag.to_string(),
            owner: Some(node),
            ..HostNode::default()
        };
        Self::apply_attributes(&mut host_node, None, props);

        let id = self.alloc(host_node);
        tracing::trace!(%id, tag, "host create");
        self.ops.push(HostOp::Create {
            id,
            tag: tag.to_string(),
        });
        Ok(id)
    }

    fn append_child(
        &mut self,
        parent: &HostNodeId,
        child: &HostNodeId,
        position: &HostPosition,
    ) -> Result<(), HostError> {
        self.check_failure()?;
        self.node_mut(*child)?;
        self.node_mut(*parent)?;

        // Moving an attached node detaches it first.
        self.unlink(*child);

        let parent_node = self.node_mut(*parent)?;
        let replaced = parent_node.children.insert(position.clone(), *child);

        if let Some(old) = replaced {
            if let Some(old_node) = self.nodes.get_mut(old.0) {
                old_node.parent = None;
            }
        }
        self.node_mut(*child)?.parent = Some(*parent);

        self.ops.push(match replaced {
            Some(old) => HostOp::Replace {
                parent: *parent,
                old,
                new: *child,
                position: position.clone(),
            },
            None => HostOp::Append {
                parent: *parent,
                child: *child,
                position: position.clone(),
            },
        });
        Ok(())
    }

    fn remove_child(
        &mut self,
        parent: &HostNodeId,
        child: &HostNodeId,
        position: &HostPosition,
    ) -> Result<(), HostError> {
        self.check_failure()?;

        let parent_node = self.node_mut(*parent)?;
        if parent_node.children.get(position) != Some(child) {
            return Err(HostError::MissingSibling {
                position: position.clone(),
            });
        }
        parent_node.children.remove(position);
        self.node_mut(*child)?.parent = None;

        self.ops.push(HostOp::Remove {
            parent: *parent,
            child: *child,
            position: position.clone(),
        });
        Ok(())
    }

    fn commit_update(
        &mut self,
        instance: &HostNodeId,
        old: &Props,
        new: &Props,
        _position: &HostPosition,
    ) -> Result<(), HostError> {
        self.check_failure()?;

        let node = self.node_mut(*instance)?;
        Self::apply_attributes(node, Some(old), new);
        self.ops.push(HostOp::Update { id: *instance });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_id() -> NodeId {
        NodeId::new(0, 0)
    }

    fn element(host: &mut MemoryHost, tag: &str) -> HostNodeId {
        host.create_instance(tag, &Props::new(), node_id())
            .expect("create")
    }

    #[test]
    fn test_positional_insert() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = element(&mut host, "a");
        let b = element(&mut host, "b");
        let c = element(&mut host, "c");

        host.append_child(&root, &c, &HostPosition::index(3)).expect("append");
        host.append_child(&root, &a, &HostPosition::index(0)).expect("append");
        host.append_child(&root, &b, &HostPosition::new(vec![1, 0])).expect("append");

        assert_eq!(host.children(root), vec![a, b, c]);
        assert_eq!(host.to_markup(root), "<root><a></a><b></b><c></c></root>");
    }

    #[test]
    fn test_equal_position_replaces() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = element(&mut host, "a");
        let b = element(&mut host, "b");

        host.append_child(&root, &a, &HostPosition::index(1)).expect("append");
        host.append_child(&root, &b, &HostPosition::index(1)).expect("append");

        assert_eq!(host.children(root), vec![b]);
        assert_eq!(host.node(a).and_then(|n| n.parent), None);
        assert!(matches!(host.ops().last(), Some(HostOp::Replace { old, new, .. }) if *old == a && *new == b));
    }

    #[test]
    fn test_remove_requires_recorded_position() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = element(&mut host, "a");
        host.append_child(&root, &a, &HostPosition::index(0)).expect("append");

        let wrong = host.remove_child(&root, &a, &HostPosition::index(2));
        assert_eq!(
            wrong,
            Err(HostError::MissingSibling {
                position: HostPosition::index(2)
            })
        );

        host.remove_child(&root, &a, &HostPosition::index(0)).expect("remove");
        assert!(host.children(root).is_empty());
    }

    #[test]
    fn test_update_attributes() {
        let mut host = MemoryHost::new();
        let old = Props::new().with("class", "a").with("id", "x").with("title", "t");
        let div = host.create_instance("div", &old, node_id()).expect("create");
        assert_eq!(host.node(div).and_then(|n| n.class_name.clone()), Some("a".to_string()));

        let new = Props::new().with("class", "b").with("id", None::<&str>);
        host.commit_update(&div, &old, &new, &HostPosition::index(0)).expect("update");

        let node = host.node(div).expect("node");
        assert_eq!(node.class_name.as_deref(), Some("b"));
        assert!(node.attributes.is_empty());
    }

    #[test]
    fn test_text_nodes() {
        let mut host = MemoryHost::new();
        let root = host.create_container("p");
        let text = host
            .create_instance(TEXT_TAG, &Props::new().with(TEXT_VALUE, "hi"), node_id())
            .expect("create");
        host.append_child(&root, &text, &HostPosition::index(0)).expect("append");
        host.commit_update(
            &text,
            &Props::new().with(TEXT_VALUE, "hi"),
            &Props::new().with(TEXT_VALUE, "bye"),
            &HostPosition::index(0),
        )
        .expect("update");

        assert_eq!(host.text_content(root), "bye");
        assert_eq!(host.to_markup(root), "<p>bye</p>");
    }

    #[test]
    fn test_fail_next() {
        let mut host = MemoryHost::new();
        host.fail_next(HostError::Rejected("nope".into()));
        assert!(host.create_instance("div", &Props::new(), node_id()).is_err());
        assert!(host.create_instance("div", &Props::new(), node_id()).is_ok());
    }
}
