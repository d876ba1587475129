use axum::http::StatusCode;

use crate::dispatch::error::{DispatchError, FailureKind};

pub const SENT_MESSAGE: &str = "Email send";

/// Per-request result: numeric status plus a human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: StatusCode,
    pub message: String,
}

impl RequestOutcome {
    pub fn sent() -> Self {
        Self {
            status: StatusCode::OK,
            message: SENT_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<&DispatchError> for RequestOutcome {
    fn from(err: &DispatchError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

/// Position in the dispatch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authorized,
    RouteResolved,
    Rendered,
    Sent,
    Failed(FailureKind),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => f.write_str("received"),
            Stage::Authorized => f.write_str("authorized"),
            Stage::RouteResolved => f.write_str("route_resolved"),
            Stage::Rendered => f.write_str("rendered"),
            Stage::Sent => f.write_str("sent"),
            Stage::Failed(kind) => write!(f, "failed({:?})", kind),
        }
    }
}
