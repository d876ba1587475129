//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handler)
//!     → request.rs (request ID, origin, payload, token)
//!     → [dispatch pipeline]
//!     → response.rs (RequestOutcome → JSON body + status)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{PayloadError, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
