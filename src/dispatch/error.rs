//! Dispatch failure taxonomy.
//!
//! Every stage failure is turned into one of these variants; `status()` and
//! the `Display` text are the only mapping to what callers see.

use axum::http::StatusCode;
use thiserror::Error;

use crate::mail::{EnvelopeError, TransportError};
use crate::security::DenyReason;
use crate::template::RenderError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Your are not allowed to query this api")]
    Forbidden,

    #[error("Your token is not valid for this api")]
    Unauthorized,

    #[error("The asked route is not available")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Unable to send the email: {0}")]
    Dispatch(#[from] TransportError),

    /// Detail is logged, never returned to the caller.
    #[error("Internal server error")]
    Internal(String),
}

/// Short classification used in logs and stage tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Forbidden,
    Unauthorized,
    NotFound,
    BadRequest,
    DispatchError,
    InternalError,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Forbidden => StatusCode::FORBIDDEN,
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::NotFound => StatusCode::NOT_FOUND,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Dispatch(_) | DispatchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::Forbidden => FailureKind::Forbidden,
            DispatchError::Unauthorized => FailureKind::Unauthorized,
            DispatchError::NotFound => FailureKind::NotFound,
            DispatchError::BadRequest(_) => FailureKind::BadRequest,
            DispatchError::Dispatch(_) => FailureKind::DispatchError,
            DispatchError::Internal(_) => FailureKind::InternalError,
        }
    }
}

impl From<DenyReason> for DispatchError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Forbidden => DispatchError::Forbidden,
            DenyReason::Unauthorized => DispatchError::Unauthorized,
        }
    }
}

impl From<RenderError> for DispatchError {
    fn from(err: RenderError) -> Self {
        DispatchError::BadRequest(err.to_string())
    }
}

impl From<EnvelopeError> for DispatchError {
    fn from(err: EnvelopeError) -> Self {
        DispatchError::BadRequest(err.to_string())
    }
}
