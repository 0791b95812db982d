//! Hook Runtime - positional per-instance state for components.
//!
//! Hooks are identified by call order. Every component render runs inside a
//! [`RenderFrame`](frame) holding the Node's hook slots and a cursor; each
//! hook call consumes the slot under the cursor and advances it.
//!
//! ```text
//! render #1                        render #2
//! use_state(0)      → slot 0       use_state(0)      → slot 0 (kept value)
//! use_context(&t)   → slot 1       use_context(&t)   → slot 1
//! use_effect(f, d)  → slot 2       use_effect(f, d)  → slot 2 (deps compared)
//! ```
//!
//! A render calling hooks in a different order is rejected with
//! [`ViewError::HookOrderViolation`](crate::ViewError::HookOrderViolation);
//! a different count with
//! [`ViewError::HookCountMismatch`](crate::ViewError::HookCountMismatch).
//!
//! State setters never mutate a slot directly. They enqueue an [`Update`]
//! that the root applies between renders.

mod consume;
mod effect;
mod frame;
mod queue;
mod refs;
mod state;

use std::any::Any;
use std::rc::Rc;

use crate::context::ContextId;

pub use consume::use_context;
pub use effect::{use_effect, use_layout_effect};
pub use frame::reset_render_stack;
pub use refs::{use_ref, Ref};
pub use state::{use_state, use_state_with, SetState};

pub(crate) use effect::{EffectSlot, PendingEffect};
pub(crate) use frame::{render_component, RenderRequest};
pub(crate) use queue::{Update, UpdateQueue};

/// What a hook slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    State,
    Effect,
    LayoutEffect,
    Context,
    Ref,
}

/// One positional hook slot.
pub(crate) enum HookSlot {
    State(Box<dyn Any>),
    Effect(EffectSlot),
    LayoutEffect(EffectSlot),
    Context(ContextId),
    Ref(Rc<dyn Any>),
}

impl HookSlot {
    pub(crate) fn kind(&self) -> HookKind {
        match self {
            HookSlot::State(_) => HookKind::State,
            HookSlot::Effect(_) => HookKind::Effect,
            HookSlot::LayoutEffect(_) => HookKind::LayoutEffect,
            HookSlot::Context(_) => HookKind::Context,
            HookSlot::Ref(_) => HookKind::Ref,
        }
    }

    /// Effect record of either effect kind.
    pub(crate) fn effect_mut(&mut self) -> Option<&mut EffectSlot> {
        match self {
            HookSlot::Effect(slot) | HookSlot::LayoutEffect(slot) => Some(slot),
            _ => None,
        }
    }
}
