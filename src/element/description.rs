//! Descriptions - the immutable output of a render call.
//!
//! A description names what should exist at a position (a host tag, a text
//! leaf, a component, a fragment, a context provider, an error boundary) and
//! carries its key, props and ordered children. The reconciler compares a
//! new description against the Node at the same position to decide whether
//! the Node can be reused.

use std::rc::Rc;

use crate::context::Provider;
use crate::primitives::{Component, ErrorBoundary};
use crate::types::Key;
use super::props::{PropValue, Props};

/// Tag passed to the host adapter for text leaves.
pub const TEXT_TAG: &str = "text";

/// Prop carrying a text leaf's content.
pub const TEXT_VALUE: &str = "value";

// =============================================================================
// Element
// =============================================================================

/// A declarative description of one tree position.
#[derive(Clone, Debug, Default)]
pub enum Element {
    /// Nothing at this position. The child slot stays empty.
    #[default]
    Empty,
    Text(Rc<str>),
    Host(HostElement),
    Component(ComponentElement),
    Fragment(Fragment),
    Provider(Provider),
    ErrorBoundary(ErrorBoundary),
}

impl Element {
    /// Start a host element description.
    pub fn host(tag: impl Into<Rc<str>>) -> HostElement {
        HostElement {
            tag: tag.into(),
            key: None,
            props: Props::new(),
        }
    }

    pub fn text(content: impl Into<Rc<str>>) -> Element {
        Element::Text(content.into())
    }

    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Element {
        Element::Fragment(Fragment {
            key: None,
            children: children.into_iter().collect(),
        })
    }

    pub fn keyed_fragment(key: impl Into<Key>, children: impl IntoIterator<Item = Element>) -> Element {
        Element::Fragment(Fragment {
            key: Some(key.into()),
            children: children.into_iter().collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Element::Empty | Element::Text(_) | Element::Provider(_) => None,
            Element::Host(h) => h.key.as_ref(),
            Element::Component(c) => c.key.as_ref(),
            Element::Fragment(f) => f.key.as_ref(),
            Element::ErrorBoundary(b) => b.key.as_ref(),
        }
    }

    /// Name used in failure paths and logs.
    pub fn display_name(&self) -> String {
        match self {
            Element::Empty => "Empty".to_string(),
            Element::Text(_) => "#text".to_string(),
            Element::Host(h) => h.tag.to_string(),
            Element::Component(c) => c.component.name().to_string(),
            Element::Fragment(_) => "Fragment".to_string(),
            Element::Provider(p) => format!("{}.Provider", p.name),
            Element::ErrorBoundary(_) => "ErrorBoundary".to_string(),
        }
    }

    /// Child descriptions rendered below this description.
    ///
    /// Components have none here: their single child is whatever their
    /// render function returns.
    pub fn child_descriptions(&self) -> &[Element] {
        match self {
            Element::Empty | Element::Text(_) | Element::Component(_) => &[],
            Element::Host(h) => h.props.children(),
            Element::Fragment(f) => &f.children,
            Element::Provider(p) => &p.children,
            Element::ErrorBoundary(b) => &b.children,
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::text(value)
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Element::Empty, Into::into)
    }
}

// =============================================================================
// Host Element
// =============================================================================

/// A platform node description (`div`, `img`, ...).
#[derive(Clone, Debug)]
pub struct HostElement {
    pub tag: Rc<str>,
    pub key: Option<Key>,
    pub props: Props,
}

impl HostElement {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.props.push_child(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        for child in children {
            self.props.push_child(child);
        }
        self
    }
}

impl From<HostElement> for Element {
    fn from(value: HostElement) -> Self {
        Element::Host(value)
    }
}

// =============================================================================
// Component Element
// =============================================================================

/// A component invocation: the component plus the props it renders with.
#[derive(Clone, Debug)]
pub struct ComponentElement {
    pub component: Component,
    pub key: Option<Key>,
    pub props: Props,
}

impl From<ComponentElement> for Element {
    fn from(value: ComponentElement) -> Self {
        Element::Component(value)
    }
}

// =============================================================================
// Fragment
// =============================================================================

/// Groups children without a host node of its own.
#[derive(Clone, Debug, Default)]
pub struct Fragment {
    pub key: Option<Key>,
    pub children: Vec<Element>,
}

impl From<Fragment> for Element {
    fn from(value: Fragment) -> Self {
        Element::Fragment(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_builder() {
        let element: Element = Element::host("ul")
            .key("list")
            .attr("class", "items")
            .child(Element::host("li").child("one"))
            .child(Element::host("li").child("two"))
            .into();

        assert_eq!(element.key(), Some(&Key::from("list")));
        assert_eq!(element.display_name(), "ul");
        assert_eq!(element.child_descriptions().len(), 2);

        match &element.child_descriptions()[0] {
            Element::Host(li) => match &li.props.children()[0] {
                Element::Text(t) => assert_eq!(&**t, "one"),
                other => panic!("expected text, got {other:?}"),
            },
            other => panic!("expected host, got {other:?}"),
        }
    }

    #[test]
    fn test_option_into_element() {
        let some: Element = Some("x").into();
        let none: Element = None::<&str>.into();
        assert!(matches!(some, Element::Text(_)));
        assert!(none.is_empty());
    }

    #[test]
    fn test_fragment_children() {
        let fragment = Element::keyed_fragment(1, vec![Element::text("a"), Element::Empty]);
        assert_eq!(fragment.key(), Some(&Key::Int(1)));
        assert_eq!(fragment.child_descriptions().len(), 2);
        assert!(fragment.child_descriptions()[1].is_empty());
    }
}
