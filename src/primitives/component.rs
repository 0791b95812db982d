//! Component - a named render function with a stable identity.
//!
//! The identity (not the name) decides whether a Node can be reused: two
//! components with the same name are still different components.
//!
//! # Example
//!
//! ```ignore
//! use spark_view::{Component, Element, Props, use_state};
//!
//! let counter = Component::new("Counter", |props: &Props| {
//!     let (count, _set_count) = use_state(props.int("start").unwrap_or(0))?;
//!     Ok(Element::host("span").child(count.to_string()).into())
//! });
//!
//! let element = counter.element(Props::new().with("start", 5));
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::{ComponentElement, Element, Props};
use crate::error::ViewError;
use crate::types::Key;

/// Render function signature.
pub type RenderFn = dyn Fn(&Props) -> Result<Element, ViewError>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A component definition. Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: Rc<str>,
    render: Rc<RenderFn>,
    memo: bool,
}

impl Component {
    /// Define a component.
    pub fn new(
        name: impl Into<Rc<str>>,
        render: impl Fn(&Props) -> Result<Element, ViewError> + 'static,
    ) -> Self {
        Self {
            id: ComponentId::next(),
            name: name.into(),
            render: Rc::new(render),
            memo: false,
        }
    }

    /// Define a memoised component.
    ///
    /// A memoised component skips its render function when its props are
    /// structurally equal to the previous render's props and it has no
    /// pending state update.
    pub fn memo(
        name: impl Into<Rc<str>>,
        render: impl Fn(&Props) -> Result<Element, ViewError> + 'static,
    ) -> Self {
        Self {
            memo: true,
            ..Self::new(name, render)
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_memo(&self) -> bool {
        self.memo
    }

    /// Describe an invocation of this component.
    pub fn element(&self, props: Props) -> Element {
        Element::Component(ComponentElement {
            component: self.clone(),
            key: None,
            props,
        })
    }

    /// Describe a keyed invocation of this component.
    pub fn keyed(&self, key: impl Into<Key>, props: Props) -> Element {
        Element::Component(ComponentElement {
            component: self.clone(),
            key: Some(key.into()),
            props,
        })
    }

    pub(crate) fn call(&self, props: &Props) -> Result<Element, ViewError> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("memo", &self.memo)
            .finish()
    }
}
