//! Factrice: templated email dispatch over HTTP.
//!
//! Each route names an HTML template plus a list of bindings. A request to
//! `/{route}` supplies data; the matching elements are filled in and the
//! result is mailed out through SMTP.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod mail;
pub mod routing;
pub mod template;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServiceConfig;
pub use dispatch::{Dispatcher, RequestOutcome};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
