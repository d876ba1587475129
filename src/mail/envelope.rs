//! Outbound message descriptors.

use lettre::message::Mailbox;
use serde_json::Value;
use thiserror::Error;

use crate::template::payload;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

/// Envelope fields as supplied by the caller, before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailHeaders {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
}

impl MailHeaders {
    /// Read `from`, `to` and `subject` out of a request payload.
    ///
    /// `to` may be a string (comma separated) or an array of strings.
    pub fn from_payload(payload: &Value) -> Self {
        let from = payload
            .get("from")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let to = match payload.get("to") {
            Some(Value::String(list)) => split_addresses(list),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(split_addresses)
                .collect(),
            _ => Vec::new(),
        };

        let subject = payload
            .get("subject")
            .map(payload::to_text)
            .unwrap_or_default();

        Self { from, to, subject }
    }
}

fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A complete message handed to the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

impl MailEnvelope {
    /// Combine caller headers with the rendered body.
    ///
    /// `from` falls back to `default_from`; every address must parse as a mailbox.
    pub fn assemble(
        headers: &MailHeaders,
        html: String,
        default_from: Option<&str>,
    ) -> Result<Self, EnvelopeError> {
        let from = headers
            .from
            .as_deref()
            .or(default_from)
            .ok_or(EnvelopeError::MissingField("from"))?;
        if headers.to.is_empty() {
            return Err(EnvelopeError::MissingField("to"));
        }
        for address in std::iter::once(from).chain(headers.to.iter().map(String::as_str)) {
            address
                .parse::<Mailbox>()
                .map_err(|_| EnvelopeError::InvalidAddress(address.to_string()))?;
        }

        Ok(Self {
            from: from.to_string(),
            to: headers.to.clone(),
            subject: headers.subject.clone(),
            html,
        })
    }
}
