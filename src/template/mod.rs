//! Template binding subsystem.
//!
//! # Data Flow
//! ```text
//! template.html → document.rs (owned node tree, parsed once)
//! bindings.toml → binding.rs  (ordered, marker-unique BindingSpec)
//!
//! Per request:
//!     renderer.rs clones the tree
//!     → for each binding: locate marker, resolve payload path (payload.rs), write value
//!     → serialize clone → rendered markup
//! ```

pub mod binding;
pub mod document;
pub mod payload;
pub mod renderer;

pub use binding::{BindingEntry, BindingError, BindingSpec, WriteTarget};
pub use document::{Document, MarkupError};
pub use renderer::{RenderError, Template, TemplateRenderer, DEFAULT_MARKER_ATTRIBUTE};
