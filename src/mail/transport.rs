//! Mail transport trait and error types

use async_trait::async_trait;
use thiserror::Error;

use crate::mail::envelope::MailEnvelope;

/// Mail transport error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Outbound mail delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. No retry is attempted.
    async fn send(&self, envelope: &MailEnvelope) -> Result<(), TransportError>;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}
