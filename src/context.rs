//! Context - values provided to a whole subtree.
//!
//! Every context has its own stack of provider values. A Provider pushes its
//! value before its subtree renders and pops it when that render finishes;
//! the pop is tied to a drop guard so it happens exactly once, also when the
//! subtree fails. Nested Providers for the same context push further frames,
//! so `use_context` always sees the innermost value.
//!
//! ```text
//! Theme.Provider("dark")        stack: [dark]
//!   ├─ Consumer                 → "dark"
//!   └─ Theme.Provider("light")  stack: [dark, light]
//!        └─ Consumer            → "light"
//! ```
//!
//! # Example
//!
//! ```ignore
//! let theme = Context::new("Theme", "light");
//!
//! let consumer = Component::new("Consumer", {
//!     let theme = theme.clone();
//!     move |_| Ok(Element::text(use_context(&theme)?))
//! });
//!
//! theme.provider("dark", vec![consumer.element(Props::new())]);
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::Element;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

// =============================================================================
// Context
// =============================================================================

/// A context definition: identity, name and default value.
pub struct Context<T> {
    id: ContextId,
    name: Rc<str>,
    default: Rc<T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: 'static> Context<T> {
    pub fn new(name: impl Into<Rc<str>>, default: T) -> Self {
        Self {
            id: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            default: Rc::new(default),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Describe a Provider of `value` for `children`.
    pub fn provider(&self, value: T, children: impl IntoIterator<Item = Element>) -> Element {
        Element::Provider(Provider {
            context: self.id,
            name: self.name.clone(),
            value: Rc::new(value),
            children: children.into_iter().collect(),
        })
    }

    /// Innermost provided value, or the default.
    pub(crate) fn current(&self) -> Rc<T> {
        current_value(self.id)
            .and_then(|value| value.downcast::<T>().ok())
            .unwrap_or_else(|| self.default.clone())
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Provider description.
#[derive(Clone)]
pub struct Provider {
    pub context: ContextId,
    pub name: Rc<str>,
    pub value: Rc<dyn Any>,
    pub children: Vec<Element>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Provider Stacks
// =============================================================================

thread_local! {
    /// Active provider values per context, innermost last.
    static PROVIDER_STACKS: RefCell<HashMap<ContextId, Vec<Rc<dyn Any>>>> =
        RefCell::new(HashMap::new());
}

/// Pops its provider frame when dropped.
#[must_use = "the provider value is popped as soon as the guard is dropped"]
pub(crate) struct ProviderGuard {
    context: ContextId,
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        PROVIDER_STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if let Some(stack) = stacks.get_mut(&self.context) {
                stack.pop();
                if stack.is_empty() {
                    stacks.remove(&self.context);
                }
            }
        });
    }
}

/// Push a provider value for the lifetime of the returned guard.
pub(crate) fn push_provider(context: ContextId, value: Rc<dyn Any>) -> ProviderGuard {
    PROVIDER_STACKS.with(|stacks| {
        stacks.borrow_mut().entry(context).or_default().push(value);
    });
    ProviderGuard { context }
}

/// Innermost active value for a context.
pub(crate) fn current_value(context: ContextId) -> Option<Rc<dyn Any>> {
    PROVIDER_STACKS.with(|stacks| {
        stacks
            .borrow()
            .get(&context)
            .and_then(|stack| stack.last().cloned())
    })
}

/// Number of active Providers for a context.
pub fn provider_depth(context: ContextId) -> usize {
    PROVIDER_STACKS.with(|stacks| stacks.borrow().get(&context).map_or(0, Vec::len))
}

/// Reset all provider stacks (for testing).
pub fn reset_context_stacks() {
    PROVIDER_STACKS.with(|stacks| stacks.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_without_provider() {
        reset_context_stacks();

        let theme = Context::new("Theme", "light".to_string());
        assert_eq!(*theme.current(), "light");
        assert_eq!(provider_depth(theme.id()), 0);
    }

    #[test]
    fn test_nested_providers() {
        reset_context_stacks();

        let theme = Context::new("Theme", "light".to_string());

        let outer = push_provider(theme.id(), Rc::new("dark".to_string()));
        assert_eq!(*theme.current(), "dark");

        {
            let _inner = push_provider(theme.id(), Rc::new("blue".to_string()));
            assert_eq!(*theme.current(), "blue");
            assert_eq!(provider_depth(theme.id()), 2);
        }

        assert_eq!(*theme.current(), "dark");
        drop(outer);
        assert_eq!(*theme.current(), "light");
        assert_eq!(provider_depth(theme.id()), 0);
    }

    #[test]
    fn test_contexts_are_independent() {
        reset_context_stacks();

        let a = Context::new("A", 1u32);
        let b = Context::new("B", 2u32);

        let _guard = push_provider(a.id(), Rc::new(10u32));
        assert_eq!(*a.current(), 10);
        assert_eq!(*b.current(), 2);
    }

    #[test]
    fn test_provider_description() {
        let ctx = Context::new("Ctx", 0i32);
        let element = ctx.provider(5, vec![Element::text("x")]);

        match element {
            Element::Provider(p) => {
                assert_eq!(p.context, ctx.id());
                assert_eq!(p.value.downcast_ref::<i32>(), Some(&5));
                assert_eq!(p.children.len(), 1);
            }
            other => panic!("expected provider, got {other:?}"),
        }
    }
}
