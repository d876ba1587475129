//! Dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! DispatchRequest (origin, route, token, payload, mail headers)
//!     → security gates        → Forbidden | Unauthorized
//!     → route registry lookup → NotFound
//!     → template render + envelope assembly → BadRequest
//!     → mail transport send   → DispatchError
//!     → log sink (always)     → RequestOutcome {status, message}
//! ```

pub mod error;
pub mod log;
pub mod orchestrator;
pub mod outcome;

pub use error::{DispatchError, FailureKind};
pub use log::{DispatchLog, DispatchRecord, TracingDispatchLog};
pub use orchestrator::{DispatchContext, DispatchRequest, Dispatcher};
pub use outcome::{RequestOutcome, Stage, SENT_MESSAGE};
