//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (origin, token):
//!     → gate.rs WhitelistGate (origin membership)
//!     → gate.rs TokenGate (origin-keyed token comparison)
//!     → Allow, or Deny(Forbidden | Unauthorized)
//! ```
//!
//! # Design Decisions
//! - Fail closed: an enabled check with no matching entry denies
//! - No trust in client input

pub mod gate;

pub use gate::{
    authorize, AuthorizationGate, DenyReason, Gate, GateRequest, TokenGate, Verdict, WhitelistGate,
};
