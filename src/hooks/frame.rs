//! Render frames - the hook slots of the component currently rendering.
//!
//! A frame is pushed before a component's render function runs and popped
//! when it returns, fails or unwinds. Frames nest, so the innermost frame is
//! always the one the running hook belongs to.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::element::Element;
use crate::error::ViewError;
use crate::types::NodeId;
use super::{HookKind, HookSlot, PendingEffect, UpdateQueue};

// =============================================================================
// Render Frame
// =============================================================================

pub(crate) struct RenderFrame {
    pub(crate) node: NodeId,
    pub(crate) component: Rc<str>,
    pub(crate) hooks: Vec<HookSlot>,
    pub(crate) cursor: usize,
    pub(crate) queue: Weak<RefCell<UpdateQueue>>,
    pub(crate) effects: Vec<PendingEffect>,
}

impl RenderFrame {
    /// Claim the slot under the cursor for a hook of `kind`.
    ///
    /// Returns the slot index. The slot exists already when the index is
    /// below `hooks.len()`; otherwise the caller stores a fresh slot there.
    pub(crate) fn claim(&mut self, kind: HookKind) -> Result<usize, ViewError> {
        let slot = self.cursor;
        if let Some(existing) = self.hooks.get(slot) {
            if existing.kind() != kind {
                return Err(ViewError::HookOrderViolation {
                    component: self.component.to_string(),
                    slot,
                    expected: existing.kind(),
                    found: kind,
                });
            }
        }
        self.cursor += 1;
        Ok(slot)
    }

    /// Store a fresh slot at `index`.
    pub(crate) fn store(&mut self, index: usize, slot: HookSlot) {
        if index < self.hooks.len() {
            self.hooks[index] = slot;
        } else {
            self.hooks.push(slot);
        }
    }

    pub(crate) fn type_mismatch(&self, slot: usize) -> ViewError {
        ViewError::HookTypeMismatch {
            component: self.component.to_string(),
            slot,
        }
    }
}

thread_local! {
    /// Frames of the components currently rendering, innermost last.
    static RENDER_STACK: RefCell<Vec<RenderFrame>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` against the innermost frame.
///
/// `f` must not call back into user code: the stack stays borrowed for the
/// duration of the call.
pub(crate) fn with_frame<R>(
    hook: &'static str,
    f: impl FnOnce(&mut RenderFrame) -> Result<R, ViewError>,
) -> Result<R, ViewError> {
    RENDER_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack
            .last_mut()
            .ok_or(ViewError::HookOutsideRender { hook })?;
        f(frame)
    })
}

/// Reset the render stack (for testing).
pub fn reset_render_stack() {
    RENDER_STACK.with(|stack| stack.borrow_mut().clear());
}

// =============================================================================
// Component Render
// =============================================================================

/// Everything needed to render one component.
pub(crate) struct RenderRequest {
    pub node: NodeId,
    pub component: Rc<str>,
    pub hooks: Vec<HookSlot>,
    pub first_render: bool,
    pub queue: Weak<RefCell<UpdateQueue>>,
    pub validate_count: bool,
}

/// Result of one component render.
///
/// The hook slots always come back, also when the render failed.
pub(crate) struct RenderOutcome {
    pub hooks: Vec<HookSlot>,
    pub effects: Vec<PendingEffect>,
    pub result: Result<Element, ViewError>,
}

/// Pops the frame if the render unwinds.
struct FrameGuard {
    finished: bool,
}

impl FrameGuard {
    fn finish(mut self) -> Option<RenderFrame> {
        self.finished = true;
        RENDER_STACK.with(|stack| stack.borrow_mut().pop())
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if !self.finished {
            RENDER_STACK.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
}

/// Run `render` inside a fresh frame built from `request`.
pub(crate) fn render_component(
    request: RenderRequest,
    render: impl FnOnce() -> Result<Element, ViewError>,
) -> RenderOutcome {
    let previous_count = (!request.first_render).then_some(request.hooks.len());
    let component = request.component.clone();

    RENDER_STACK.with(|stack| {
        stack.borrow_mut().push(RenderFrame {
            node: request.node,
            component: request.component,
            hooks: request.hooks,
            cursor: 0,
            queue: request.queue,
            effects: Vec::new(),
        });
    });

    let guard = FrameGuard { finished: false };
    let result = render();

    let Some(frame) = guard.finish() else {
        return RenderOutcome {
            hooks: Vec::new(),
            effects: Vec::new(),
            result: Err(ViewError::HookOutsideRender { hook: "render" }),
        };
    };

    let result = match (result, previous_count) {
        (Ok(_), Some(expected)) if request.validate_count && frame.cursor != expected => {
            Err(ViewError::HookCountMismatch {
                component: component.to_string(),
                expected,
                found: frame.cursor,
            })
        }
        (result, _) => result,
    };

    let effects = if result.is_ok() { frame.effects } else { Vec::new() };

    RenderOutcome {
        hooks: frame.hooks,
        effects,
        result,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hooks::use_state;

    /// Render `render` as node #1 with the given slots.
    pub(crate) fn render_with(
        hooks: Vec<HookSlot>,
        first_render: bool,
        queue: &Rc<RefCell<UpdateQueue>>,
        render: impl FnOnce() -> Result<Element, ViewError>,
    ) -> RenderOutcome {
        render_component(
            RenderRequest {
                node: NodeId::new(1, 0),
                component: Rc::from("Test"),
                hooks,
                first_render,
                queue: Rc::downgrade(queue),
                validate_count: true,
            },
            render,
        )
    }

    #[test]
    fn test_hook_outside_render() {
        reset_render_stack();

        let result = use_state(0);
        assert!(matches!(
            result,
            Err(ViewError::HookOutsideRender { hook: "use_state" })
        ));
    }

    #[test]
    fn test_frame_popped_after_render() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let outcome = render_with(Vec::new(), true, &queue, || {
            use_state(1)?;
            Ok(Element::Empty)
        });
        assert!(outcome.result.is_ok());
        assert_eq!(outcome.hooks.len(), 1);
        assert!(use_state(0).is_err());
    }

    #[test]
    fn test_frame_popped_after_failure() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let outcome = render_with(Vec::new(), true, &queue, || Err(ViewError::thrown("boom")));
        assert!(matches!(outcome.result, Err(ViewError::Thrown { .. })));
        assert!(outcome.effects.is_empty());
        RENDER_STACK.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn test_count_mismatch_detected() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let first = render_with(Vec::new(), true, &queue, || {
            use_state(1)?;
            use_state(2)?;
            Ok(Element::Empty)
        });

        let second = render_with(first.hooks, false, &queue, || {
            use_state(1)?;
            Ok(Element::Empty)
        });

        assert!(matches!(
            second.result,
            Err(ViewError::HookCountMismatch { expected: 2, found: 1, .. })
        ));
    }
}
