//! Props - attribute values and child descriptions passed to a Node.
//!
//! A prop value is a tagged variant. Plain data (`Bool`, `Int`, `Str`, ...)
//! compares structurally. Nested descriptions (`Element`) compare through
//! their equatable form. Live instances (`Node`) are never compared by
//! identity; the equatable form replaces them with a placeholder. Opaque
//! shared values (`Opaque`) compare by pointer identity.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::NodeId;
use super::description::Element;

// =============================================================================
// PropValue
// =============================================================================

/// A single prop value.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<PropValue>),
    /// A nested description.
    Element(Box<Element>),
    /// A reference to a live Node.
    Node(NodeId),
    /// Any shared value, compared by identity.
    Opaque(Rc<dyn Any>),
}

impl PropValue {
    /// Wrap an arbitrary value as an opaque prop.
    pub fn opaque<T: 'static>(value: T) -> Self {
        PropValue::Opaque(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            PropValue::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            PropValue::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Downcast an opaque value.
    pub fn as_opaque<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            PropValue::Opaque(rc) => rc.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// String form for host attributes.
    ///
    /// `Null`, descriptions, live nodes and opaque values have no attribute
    /// form.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Float(f) => Some(f.to_string()),
            PropValue::Str(s) => Some(s.to_string()),
            PropValue::List(items) => {
                let parts: Vec<String> = items.iter().filter_map(|v| v.to_attribute()).collect();
                Some(parts.join(" "))
            }
            PropValue::Null | PropValue::Element(_) | PropValue::Node(_) | PropValue::Opaque(_) => {
                None
            }
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(b) => write!(f, "Bool({b})"),
            PropValue::Int(i) => write!(f, "Int({i})"),
            PropValue::Float(x) => write!(f, "Float({x})"),
            PropValue::Str(s) => write!(f, "Str({s:?})"),
            PropValue::List(items) => f.debug_tuple("List").field(items).finish(),
            PropValue::Element(e) => f.debug_tuple("Element").field(e).finish(),
            PropValue::Node(id) => write!(f, "Node({id})"),
            PropValue::Opaque(rc) => write!(f, "Opaque({:p})", Rc::as_ptr(rc) as *const u8),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<Element> for PropValue {
    fn from(value: Element) -> Self {
        PropValue::Element(Box::new(value))
    }
}

impl From<NodeId> for PropValue {
    fn from(value: NodeId) -> Self {
        PropValue::Node(value)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        PropValue::List(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attributes plus ordered child descriptions.
///
/// Attributes are kept sorted by name so structural comparison and host
/// updates are deterministic.
#[derive(Clone, Debug, Default)]
pub struct Props {
    attrs: BTreeMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`set_children`](Self::set_children).
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.set_children(children);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.attrs.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropValue::as_bool)
    }

    /// Attributes in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn set_children(&mut self, children: impl IntoIterator<Item = Element>) {
        self.children = children.into_iter().collect();
    }

    pub fn push_child(&mut self, child: impl Into<Element>) {
        self.children.push(child.into());
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_builder() {
        let props = Props::new()
            .with("label", "Save")
            .with("count", 3)
            .with("enabled", true)
            .with_children(vec![Element::text("child")]);

        assert_eq!(props.str("label"), Some("Save"));
        assert_eq!(props.int("count"), Some(3));
        assert_eq!(props.bool("enabled"), Some(true));
        assert_eq!(props.children().len(), 1);

        let names: Vec<&str> = props.attrs().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["count", "enabled", "label"]);
    }

    #[test]
    fn test_attribute_form() {
        assert_eq!(PropValue::from("x").to_attribute(), Some("x".to_string()));
        assert_eq!(PropValue::from(7).to_attribute(), Some("7".to_string()));
        assert_eq!(PropValue::Null.to_attribute(), None);
        assert_eq!(PropValue::from(None::<&str>).to_attribute(), None);
        assert_eq!(
            PropValue::from(vec![PropValue::from("a"), PropValue::from("b")]).to_attribute(),
            Some("a b".to_string())
        );
        assert_eq!(PropValue::opaque(5u8).to_attribute(), None);
    }

    #[test]
    fn test_opaque_downcast() {
        let value = PropValue::opaque(String::from("payload"));
        assert_eq!(value.as_opaque::<String>().as_deref(), Some(&"payload".to_string()));
        assert!(value.as_opaque::<u32>().is_none());
    }
}
