//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     templates/<route>/{template.html, bindings.toml}
//!     → loader.rs (parse markup, parse bindings)
//!     → Freeze as immutable RouteRegistry
//!
//! Per request:
//!     route name (path segment)
//!     → registry.rs (lookup)
//!     → Return: RouteEntry or absent
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Templates are never re-read while serving

pub mod loader;
pub mod registry;

pub use loader::{load_directory, TemplateLoadError};
pub use registry::{RegistryError, RouteEntry, RouteRegistry};
