//! SMTP mail transport implementation using lettre

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials as SmtpCredentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{Credentials, MailConfig, TlsMode};
use crate::mail::envelope::MailEnvelope;
use crate::mail::transport::{MailTransport, TransportError};

/// SMTP relay transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Create a new SMTP transport from configuration
    pub fn from_config(
        config: &MailConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, TransportError> {
        let mut builder = match config.tls {
            TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::InvalidConfiguration(e.to_string()))?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::InvalidConfiguration(e.to_string()))?,
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.send_timeout_secs)));

        if let Some(credentials) = credentials {
            builder = builder.credentials(SmtpCredentials::new(
                credentials.username,
                credentials.password,
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse().map_err(|e| {
        TransportError::InvalidMessage(format!("invalid address '{}': {}", address, e))
    })
}

/// Build the MIME message for an envelope.
pub fn build_message(envelope: &MailEnvelope) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&envelope.from)?)
        .subject(envelope.subject.as_str());

    for to in &envelope.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    builder
        .header(ContentType::TEXT_HTML)
        .body(envelope.html.clone())
        .map_err(|e| TransportError::InvalidMessage(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, envelope: &MailEnvelope) -> Result<(), TransportError> {
        let message = build_message(envelope)?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("authentication") || error_msg.contains("AUTH") {
                    Err(TransportError::Authentication(error_msg))
                } else if error_msg.contains("connection") || error_msg.contains("timed out") {
                    Err(TransportError::Connection(error_msg))
                } else {
                    Err(TransportError::SendFailed(error_msg))
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
