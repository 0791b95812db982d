//! State hooks - `use_state` and `use_state_with`.
//!
//! ```ignore
//! let (count, set_count) = use_state(0)?;
//! set_count.update(|n| n + 1);
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Weak;

use crate::error::ViewError;
use crate::types::NodeId;
use super::frame::with_frame;
use super::{HookKind, HookSlot, Update, UpdateQueue};

/// Read or create the state slot under the cursor.
///
/// Returns the slot index and its current value, or `None` if the slot is
/// new and still has to be filled.
fn claim_state<T: Clone + 'static>(
    hook: &'static str,
) -> Result<(usize, Option<T>, SetState<T>), ViewError> {
    with_frame(hook, |frame| {
        let index = frame.claim(HookKind::State)?;
        let value = match frame.hooks.get(index) {
            Some(HookSlot::State(value)) => Some(
                value
                    .downcast_ref::<T>()
                    .cloned()
                    .ok_or_else(|| frame.type_mismatch(index))?,
            ),
            _ => None,
        };
        let setter = SetState::new(frame.node, index, frame.queue.clone());
        Ok((index, value, setter))
    })
}

fn store_state<T: 'static>(hook: &'static str, index: usize, value: T) -> Result<(), ViewError> {
    with_frame(hook, |frame| {
        frame.store(index, HookSlot::State(Box::new(value)));
        Ok(())
    })
}

/// Local state that survives re-renders.
///
/// The first render stores `initial`; later renders return the current value
/// and ignore `initial`.
pub fn use_state<T>(initial: T) -> Result<(T, SetState<T>), ViewError>
where
    T: Clone + PartialEq + 'static,
{
    let (index, value, setter) = claim_state::<T>("use_state")?;
    match value {
        Some(value) => Ok((value, setter)),
        None => {
            store_state("use_state", index, initial.clone())?;
            Ok((initial, setter))
        }
    }
}

/// Like [`use_state`], with the initial value produced lazily on first render.
pub fn use_state_with<T>(producer: impl FnOnce() -> T) -> Result<(T, SetState<T>), ViewError>
where
    T: Clone + PartialEq + 'static,
{
    let (index, value, setter) = claim_state::<T>("use_state_with")?;
    match value {
        Some(value) => Ok((value, setter)),
        None => {
            let initial = producer();
            store_state("use_state_with", index, initial.clone())?;
            Ok((initial, setter))
        }
    }
}

// =============================================================================
// SetState
// =============================================================================

/// Schedules changes to one state slot.
///
/// Cheap to clone and safe to keep in closures and effects. Updates issued
/// after the owning Node unmounted are dropped with a warning.
pub struct SetState<T> {
    node: NodeId,
    slot: usize,
    queue: Weak<RefCell<UpdateQueue>>,
    _value: PhantomData<fn(T)>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            slot: self.slot,
            queue: self.queue.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("node", &self.node)
            .field("slot", &self.slot)
            .finish()
    }
}

impl<T> SetState<T> {
    fn new(node: NodeId, slot: usize, queue: Weak<RefCell<UpdateQueue>>) -> Self {
        Self {
            node,
            slot,
            queue,
            _value: PhantomData,
        }
    }

    /// The Node owning the slot.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl<T: Clone + PartialEq + 'static> SetState<T> {

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Compute the next value from the current one.
    ///
    /// A result equal to the current value does not re-render.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        let Some(queue) = self.queue.upgrade() else {
            tracing::warn!(node = %self.node, slot = self.slot, "state update on a dropped root ignored");
            return;
        };

        let apply = Box::new(move |slot: &mut dyn Any| match slot.downcast_mut::<T>() {
            Some(current) => {
                let next = f(current);
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            }
            None => false,
        });

        queue.borrow_mut().push(Update::State {
            node: self.node,
            slot: self.slot,
            apply,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::element::Element;
    use crate::hooks::frame::tests::render_with;
    use crate::hooks::{reset_render_stack, use_effect};

    #[test]
    fn test_state_survives_rerender() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let first = render_with(Vec::new(), true, &queue, || {
            let (value, _) = use_state(10)?;
            assert_eq!(value, 10);
            Ok(Element::Empty)
        });

        let second = render_with(first.hooks, false, &queue, || {
            let (value, _) = use_state(99)?;
            assert_eq!(value, 10);
            Ok(Element::Empty)
        });
        assert!(second.result.is_ok());
    }

    #[test]
    fn test_setter_enqueues_without_mutating() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let captured = Rc::new(RefCell::new(None));

        let outcome = render_with(Vec::new(), true, &queue, {
            let captured = captured.clone();
            move || {
                let (_, set) = use_state(1)?;
                *captured.borrow_mut() = Some(set);
                Ok(Element::Empty)
            }
        });

        let set = captured.borrow_mut().take().expect("setter captured");
        set.set(2);
        set.update(|n| n + 5);
        assert_eq!(queue.borrow().len(), 2);

        let mut hooks = outcome.hooks;
        for update in queue.borrow_mut().drain() {
            if let Update::State { slot, apply, .. } = update {
                match &mut hooks[slot] {
                    HookSlot::State(value) => assert!(apply(value.as_mut())),
                    _ => panic!("expected a state slot"),
                }
            }
        }

        match &hooks[0] {
            HookSlot::State(value) => assert_eq!(value.downcast_ref::<i32>(), Some(&7)),
            _ => panic!("expected a state slot"),
        }
    }

    #[test]
    fn test_equal_update_reports_no_change() {
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let set = SetState::<i32>::new(NodeId::new(1, 0), 0, Rc::downgrade(&queue));
        set.set(3);

        let mut value: Box<dyn Any> = Box::new(3);
        for update in queue.borrow_mut().drain() {
            if let Update::State { apply, .. } = update {
                assert!(!apply(value.as_mut()));
            }
        }
    }

    #[test]
    fn test_setter_points_at_claimed_slot() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let captured = Rc::new(RefCell::new(None));

        let outcome = render_with(Vec::new(), true, &queue, {
            let captured = captured.clone();
            move || {
                use_state(0u8)?;
                let (_, set) = use_state_with(|| String::from("name"))?;
                *captured.borrow_mut() = Some(set);
                Ok(Element::Empty)
            }
        });
        assert!(outcome.result.is_ok());

        let set = captured.borrow_mut().take().expect("setter captured");
        set.set(String::from("other"));
        match queue.borrow_mut().drain().pop() {
            Some(Update::State { slot, .. }) => assert_eq!(slot, 1),
            _ => panic!("expected a state update"),
        }
    }

    #[test]
    fn test_lazy_initial_runs_once() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let calls = Rc::new(RefCell::new(0));

        let render = |calls: Rc<RefCell<i32>>| {
            move || {
                let (value, _) = use_state_with(|| {
                    *calls.borrow_mut() += 1;
                    String::from("init")
                })?;
                assert_eq!(value, "init");
                Ok(Element::Empty)
            }
        };

        let first = render_with(Vec::new(), true, &queue, render(calls.clone()));
        let _ = render_with(first.hooks, false, &queue, render(calls.clone()));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_order_violation() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let first = render_with(Vec::new(), true, &queue, || {
            use_state(0)?;
            Ok(Element::Empty)
        });

        let second = render_with(first.hooks, false, &queue, || {
            use_effect(|| None, None::<()>)?;
            Ok(Element::Empty)
        });

        assert!(matches!(
            second.result,
            Err(ViewError::HookOrderViolation {
                slot: 0,
                expected: HookKind::State,
                found: HookKind::Effect,
                ..
            })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let first = render_with(Vec::new(), true, &queue, || {
            use_state(0i32)?;
            Ok(Element::Empty)
        });

        let second = render_with(first.hooks, false, &queue, || {
            use_state(String::new())?;
            Ok(Element::Empty)
        });

        assert!(matches!(
            second.result,
            Err(ViewError::HookTypeMismatch { slot: 0, .. })
        ));
    }
}
