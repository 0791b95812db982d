//! Effect hooks - `use_effect` and `use_layout_effect`.
//!
//! An effect runs after the render that scheduled it has been committed.
//! Layout effects run synchronously right after the host mutations; passive
//! effects are deferred to the next `tick`. Effects fire child before parent.
//!
//! # Dependencies
//!
//! ```text
//! deps: None          → runs after every render
//! deps: Some(())      → runs once, after the first render
//! deps: Some((a, b))  → runs when (a, b) != previous (a, b)
//! ```
//!
//! The cleanup returned by the previous run executes immediately before the
//! next run, and when the Node unmounts.
//!
//! # Example
//!
//! ```ignore
//! use_effect(
//!     move || {
//!         tracing::info!("user changed to {user_id}");
//!         Some(Box::new(|| tracing::info!("left")) as Cleanup)
//!     },
//!     Some(user_id),
//! )?;
//! ```

use std::any::Any;
use std::fmt;

use crate::error::ViewError;
use crate::types::{Cleanup, NodeId};
use super::frame::with_frame;
use super::{HookKind, HookSlot};

/// Effect body. Returns an optional cleanup.
pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Persistent record of an effect hook.
#[derive(Default)]
pub(crate) struct EffectSlot {
    pub(crate) deps: Option<Box<dyn Any>>,
    pub(crate) cleanup: Option<Cleanup>,
}

impl EffectSlot {
    /// Run the cleanup left by the previous run, if any.
    pub(crate) fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// An effect scheduled by a render, waiting for its commit.
pub(crate) struct PendingEffect {
    pub(crate) kind: HookKind,
    pub(crate) node: NodeId,
    pub(crate) slot: usize,
    pub(crate) effect: EffectFn,
}

impl fmt::Debug for PendingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEffect")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

fn deps_changed<D: PartialEq + 'static>(previous: Option<&dyn Any>, next: Option<&D>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => previous.downcast_ref::<D>() != Some(next),
        _ => true,
    }
}

fn schedule<D, F>(hook: &'static str, kind: HookKind, effect: F, deps: Option<D>) -> Result<(), ViewError>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    with_frame(hook, |frame| {
        let index = frame.claim(kind)?;

        let changed = match frame.hooks.get_mut(index).and_then(HookSlot::effect_mut) {
            Some(slot) => {
                let changed = deps_changed(slot.deps.as_deref(), deps.as_ref());
                if changed {
                    slot.deps = deps.map(|d| Box::new(d) as Box<dyn Any>);
                }
                changed
            }
            None => {
                let slot = EffectSlot {
                    deps: deps.map(|d| Box::new(d) as Box<dyn Any>),
                    cleanup: None,
                };
                frame.store(
                    index,
                    match kind {
                        HookKind::LayoutEffect => HookSlot::LayoutEffect(slot),
                        _ => HookSlot::Effect(slot),
                    },
                );
                true
            }
        };

        if changed {
            frame.effects.push(PendingEffect {
                kind,
                node: frame.node,
                slot: index,
                effect: Box::new(effect),
            });
        }
        Ok(())
    })
}

/// Run `effect` after commit, deferred to the next tick.
///
/// Pass `None::<()>` as `deps` to run after every render.
pub fn use_effect<D, F>(effect: F, deps: Option<D>) -> Result<(), ViewError>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    schedule("use_effect", HookKind::Effect, effect, deps)
}

/// Run `effect` synchronously right after commit.
pub fn use_layout_effect<D, F>(effect: F, deps: Option<D>) -> Result<(), ViewError>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    schedule("use_layout_effect", HookKind::LayoutEffect, effect, deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::element::Element;
    use crate::hooks::frame::tests::render_with;
    use crate::hooks::{reset_render_stack, UpdateQueue};

    fn render_effect(
        hooks: Vec<HookSlot>,
        first: bool,
        queue: &Rc<RefCell<UpdateQueue>>,
        dep: i32,
    ) -> crate::hooks::frame::RenderOutcome {
        render_with(hooks, first, queue, move || {
            use_effect(|| None, Some(dep))?;
            use_layout_effect(|| None, None::<()>)?;
            Ok(Element::Empty)
        })
    }

    #[test]
    fn test_deps_gate_scheduling() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));

        let first = render_effect(Vec::new(), true, &queue, 1);
        assert_eq!(first.effects.len(), 2);
        assert_eq!(first.effects[0].kind, HookKind::Effect);
        assert_eq!(first.effects[1].kind, HookKind::LayoutEffect);

        // Same deps: only the dep-less layout effect is scheduled.
        let second = render_effect(first.hooks, false, &queue, 1);
        assert_eq!(second.effects.len(), 1);
        assert_eq!(second.effects[0].slot, 1);

        let third = render_effect(second.hooks, false, &queue, 2);
        assert_eq!(third.effects.len(), 2);
    }

    #[test]
    fn test_mount_only_effect() {
        reset_render_stack();
        let queue = Rc::new(RefCell::new(UpdateQueue::default()));
        let render = |hooks, first| {
            render_with(hooks, first, &queue, || {
                use_effect(|| None, Some(()))?;
                Ok(Element::Empty)
            })
        };

        let first = render(Vec::new(), true);
        assert_eq!(first.effects.len(), 1);
        let second = render(first.hooks, false);
        assert!(second.effects.is_empty());
    }

    #[test]
    fn test_cleanup_taken_once() {
        let ran = Rc::new(RefCell::new(0));
        let mut slot = EffectSlot::default();
        slot.cleanup = Some(Box::new({
            let ran = ran.clone();
            move || *ran.borrow_mut() += 1
        }));

        slot.run_cleanup();
        slot.run_cleanup();
        assert_eq!(*ran.borrow(), 1);
    }
}
