//! Equatable form - identity-stripped structural comparison.
//!
//! Descriptions may carry live Node references and shared closures, so they
//! cannot be compared directly. The equatable form normalises them:
//!
//! ```text
//! PropValue::Node(_)      → EquatableValue::Instance   (placeholder)
//! PropValue::Element(e)   → EquatableValue::Element(to_equatable(e))
//! PropValue::Opaque(rc)   → EquatableValue::Opaque(address)
//! children                → recursively normalised
//! ```
//!
//! Two descriptions with equal equatable forms render the same output, which
//! is what memoisation and host updates need to know.

use std::rc::Rc;

use crate::context::ContextId;
use crate::primitives::ComponentId;
use crate::types::Key;
use super::description::Element;
use super::props::{PropValue, Props};

/// Normalised description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Equatable {
    Empty,
    Text(Rc<str>),
    Host {
        tag: Rc<str>,
        key: Option<Key>,
        props: EquatableProps,
    },
    Component {
        component: ComponentId,
        key: Option<Key>,
        props: EquatableProps,
    },
    Fragment {
        key: Option<Key>,
        children: Vec<Equatable>,
    },
    Provider {
        context: ContextId,
        value: usize,
        children: Vec<Equatable>,
    },
    ErrorBoundary {
        key: Option<Key>,
        handler: usize,
        children: Vec<Equatable>,
    },
}

/// Normalised props.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquatableProps {
    pub attrs: Vec<(String, EquatableValue)>,
    pub children: Vec<Equatable>,
}

/// Normalised prop value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquatableValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Bit pattern of the float.
    Float(u64),
    Str(Rc<str>),
    List(Vec<EquatableValue>),
    Element(Box<Equatable>),
    /// Stands in for any live Node reference.
    Instance,
    /// Address of a shared value.
    Opaque(usize),
}

/// Normalise a description.
pub fn to_equatable(element: &Element) -> Equatable {
    match element {
        Element::Empty => Equatable::Empty,
        Element::Text(text) => Equatable::Text(text.clone()),
        Element::Host(host) => Equatable::Host {
            tag: host.tag.clone(),
            key: host.key.clone(),
            props: equatable_props(&host.props),
        },
        Element::Component(c) => Equatable::Component {
            component: c.component.id(),
            key: c.key.clone(),
            props: equatable_props(&c.props),
        },
        Element::Fragment(f) => Equatable::Fragment {
            key: f.key.clone(),
            children: f.children.iter().map(to_equatable).collect(),
        },
        Element::Provider(p) => Equatable::Provider {
            context: p.context,
            value: address(&p.value),
            children: p.children.iter().map(to_equatable).collect(),
        },
        Element::ErrorBoundary(b) => Equatable::ErrorBoundary {
            key: b.key.clone(),
            handler: address(&b.handler),
            children: b.children.iter().map(to_equatable).collect(),
        },
    }
}

/// Normalise props: attributes in name order, then children.
pub fn equatable_props(props: &Props) -> EquatableProps {
    EquatableProps {
        attrs: props
            .attrs()
            .map(|(name, value)| (name.to_string(), equatable_value(value)))
            .collect(),
        children: props.children().iter().map(to_equatable).collect(),
    }
}

pub fn equatable_value(value: &PropValue) -> EquatableValue {
    match value {
        PropValue::Null => EquatableValue::Null,
        PropValue::Bool(b) => EquatableValue::Bool(*b),
        PropValue::Int(i) => EquatableValue::Int(*i),
        PropValue::Float(f) => EquatableValue::Float(f.to_bits()),
        PropValue::Str(s) => EquatableValue::Str(s.clone()),
        PropValue::List(items) => EquatableValue::List(items.iter().map(equatable_value).collect()),
        PropValue::Element(e) => EquatableValue::Element(Box::new(to_equatable(e))),
        PropValue::Node(_) => EquatableValue::Instance,
        PropValue::Opaque(rc) => EquatableValue::Opaque(address(rc)),
    }
}

/// Structural equality of two prop sets, children included.
pub fn props_equal(a: &Props, b: &Props) -> bool {
    equatable_props(a) == equatable_props(b)
}

/// Structural equality of the attributes only (what a host node sees).
pub fn attrs_equal(a: &Props, b: &Props) -> bool {
    a.attr_count() == b.attr_count()
        && a
            .attrs()
            .zip(b.attrs())
            .all(|((ka, va), (kb, vb))| ka == kb && equatable_value(va) == equatable_value(vb))
}

fn address<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const u8 as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_node_references_are_stripped() {
        let a = Props::new().with("target", NodeId::new(1, 0)).with("label", "x");
        let b = Props::new().with("target", NodeId::new(9, 3)).with("label", "x");
        assert!(props_equal(&a, &b));

        let c = Props::new().with("target", NodeId::new(1, 0)).with("label", "y");
        assert!(!props_equal(&a, &c));
    }

    #[test]
    fn test_nested_descriptions_compare_structurally() {
        let make = |node: NodeId| {
            Props::new()
                .with("slot", Element::from(Element::host("span").attr("ref", node)))
                .with_children(vec![Element::host("b").child("bold").into()])
        };

        assert!(props_equal(&make(NodeId::new(1, 0)), &make(NodeId::new(2, 0))));

        let other = Props::new()
            .with("slot", Element::from(Element::host("em")))
            .with_children(vec![Element::host("b").child("bold").into()]);
        assert!(!props_equal(&make(NodeId::new(1, 0)), &other));
    }

    #[test]
    fn test_opaque_identity() {
        let shared = PropValue::opaque(42u32);
        let a = Props::new().with("data", shared.clone());
        let b = Props::new().with("data", shared);
        let c = Props::new().with("data", PropValue::opaque(42u32));

        assert!(props_equal(&a, &b));
        assert!(!props_equal(&a, &c));
    }

    #[test]
    fn test_attrs_ignore_children() {
        let a = Props::new().with("id", "x").with_children(vec![Element::text("1")]);
        let b = Props::new().with("id", "x").with_children(vec![Element::text("2")]);
        assert!(attrs_equal(&a, &b));
        assert!(!props_equal(&a, &b));
    }
}
