//! `use_context` - read the innermost provided value of a context.

use crate::context::Context;
use crate::error::ViewError;
use super::frame::with_frame;
use super::{HookKind, HookSlot};

/// Innermost value provided for `context` above the calling component, or
/// the context's default.
///
/// A slot stays bound to the context it first read; reading another context
/// there is a [`ViewError::HookTypeMismatch`].
pub fn use_context<T: Clone + 'static>(context: &Context<T>) -> Result<T, ViewError> {
    with_frame("use_context", |frame| {
        let index = frame.claim(HookKind::Context)?;
        match frame.hooks.get(index) {
            Some(HookSlot::Context(bound)) if *bound != context.id() => {
                Err(frame.type_mismatch(index))
            }
            Some(_) => Ok(()),
            None => {
                frame.store(index, HookSlot::Context(context.id()));
                Ok(())
            }
        }
    })?;

    Ok((*context.current()).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::context::{push_provider, reset_context_stacks};
    use crate::element::Element;
    use crate::hooks::frame::tests::render_with;
    use crate::hooks::{reset_render_stack, UpdateQueue};

    #[test]
    fn test_reads_innermost_provider() {
        reset_render_stack();
        reset_context_stacks();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let theme = Context::new("Theme", "light");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let render = |seen: Rc<RefCell<Vec<&'static str>>>, theme: Context<&'static str>| {
            move || {
                seen.borrow_mut().push(use_context(&theme)?);
                Ok(Element::Empty)
            }
        };

        let first = render_with(Vec::new(), true, &queue, render(seen.clone(), theme.clone()));
        let guard = push_provider(theme.id(), Rc::new("dark"));
        let second = render_with(first.hooks, false, &queue, render(seen.clone(), theme.clone()));
        drop(guard);

        assert!(second.result.is_ok());
        assert_eq!(*seen.borrow(), vec!["light", "dark"]);
    }

    #[test]
    fn test_switching_context_at_a_slot() {
        reset_render_stack();
        reset_context_stacks();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let theme = Context::new("Theme", "light");
        let locale = Context::new("Locale", "en");

        let first = render_with(Vec::new(), true, &queue, {
            let theme = theme.clone();
            move || {
                use_context(&theme)?;
                Ok(Element::Empty)
            }
        });
        let second = render_with(first.hooks, false, &queue, {
            let locale = locale.clone();
            move || {
                use_context(&locale)?;
                Ok(Element::Empty)
            }
        });

        assert!(matches!(
            second.result,
            Err(ViewError::HookTypeMismatch { slot: 0, .. })
        ));
    }

    #[test]
    fn test_outside_render() {
        reset_render_stack();
        let ctx = Context::new("Ctx", 0u8);
        assert!(matches!(
            use_context(&ctx),
            Err(ViewError::HookOutsideRender { hook: "use_context" })
        ));
    }
}
