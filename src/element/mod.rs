//! Descriptions - what a render call returns.
//!
//! - [`Element`] - one tree position's description
//! - [`Props`] / [`PropValue`] - attributes and child descriptions
//! - [`Equatable`] - identity-stripped normal form used for diffing and memo

mod description;
mod equatable;
mod props;

pub use description::*;
pub use equatable::*;
pub use props::*;
