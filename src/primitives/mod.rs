//! View Primitives - Component building blocks.
//!
//! - [`Component`] - a named render function, optionally memoised
//! - [`ErrorBoundary`] - catches failures raised below it
//!
//! Host elements, text, fragments and providers are plain descriptions built
//! through [`Element`](crate::element::Element) and
//! [`Context`](crate::context::Context).
//!
//! # Example
//!
//! ```ignore
//! let app = Component::new("App", |_| {
//!     Ok(Element::host("main")
//!         .child(ErrorBoundary::new(|failure, _| tracing::warn!("{failure}"))
//!             .child(child.element(Props::new())))
//!         .into())
//! });
//! ```

mod boundary;
mod component;

pub use boundary::*;
pub use component::*;
