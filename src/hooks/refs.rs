//! `use_ref` - a mutable cell that survives re-renders.
//!
//! Writing to a ref never schedules a render. Use it for values the render
//! output does not depend on: handles, counters read by effects, the host
//! node a description was committed to.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ViewError;
use super::frame::with_frame;
use super::{HookKind, HookSlot};

/// Shared mutable cell returned by [`use_ref`].
pub type Ref<T> = Rc<RefCell<T>>;

/// The same cell on every render of the calling component.
pub fn use_ref<T: 'static>(initial: T) -> Result<Ref<T>, ViewError> {
    with_frame("use_ref", |frame| {
        let index = frame.claim(HookKind::Ref)?;

        if let Some(HookSlot::Ref(cell)) = frame.hooks.get(index) {
            return cell
                .clone()
                .downcast::<RefCell<T>>()
                .map_err(|_| frame.type_mismatch(index));
        }

        let cell: Ref<T> = Rc::new(RefCell::new(initial));
        frame.store(index, HookSlot::Ref(cell.clone() as Rc<dyn Any>));
        Ok(cell)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::element::Element;
    use crate::hooks::frame::tests::render_with;
    use crate::hooks::{reset_render_stack, UpdateQueue};

    #[test]
    fn test_ref_is_stable() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let cells = Rc::new(RefCell::new(Vec::<Ref<u32>>::new()));

        let render = |cells: Rc<RefCell<Vec<Ref<u32>>>>| {
            move || {
                let cell = use_ref(0u32)?;
                *cell.borrow_mut() += 1;
                cells.borrow_mut().push(cell);
                Ok(Element::Empty)
            }
        };

        let first = render_with(Vec::new(), true, &queue, render(cells.clone()));
        let _ = render_with(first.hooks, false, &queue, render(cells.clone()));

        let cells = cells.borrow();
        assert!(Rc::ptr_eq(&cells[0], &cells[1]));
        assert_eq!(*cells[0].borrow(), 2);
    }
}
