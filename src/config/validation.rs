//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Reject access-control settings that can never admit a request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use lettre::message::Mailbox;

use crate::config::schema::ServiceConfig;
use crate::template::binding::is_attribute_name;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    if config.mail.host.trim().is_empty() {
        errors.push(ValidationError::new("mail.host", "must not be empty"));
    }
    if config.mail.port == 0 {
        errors.push(ValidationError::new("mail.port", "must be greater than 0"));
    }
    if config.mail.send_timeout_secs == 0 {
        errors.push(ValidationError::new("mail.send_timeout_secs", "must be greater than 0"));
    }
    if let Some(from) = &config.mail.default_from {
        if from.parse::<Mailbox>().is_err() {
            errors.push(ValidationError::new(
                "mail.default_from",
                format!("'{}' is not a valid mailbox", from),
            ));
        }
    }

    if !is_attribute_name(&config.templates.marker_attribute) {
        errors.push(ValidationError::new(
            "templates.marker_attribute",
            format!("'{}' is not a valid attribute name", config.templates.marker_attribute),
        ));
    }
    if config.templates.directory.trim().is_empty() {
        errors.push(ValidationError::new("templates.directory", "must not be empty"));
    }

    if config.whitelist.enable && config.whitelist.authorized.is_empty() {
        errors.push(ValidationError::new(
            "whitelist.authorized",
            "whitelist is enabled but lists no origin",
        ));
    }
    if config.whitelist.authorized.iter().any(|o| o.trim().is_empty()) {
        errors.push(ValidationError::new("whitelist.authorized", "contains an empty origin"));
    }

    if config.query_token.enable && config.query_token.tokens.is_empty() {
        errors.push(ValidationError::new(
            "query_token.tokens",
            "token checking is enabled but no token is defined",
        ));
    }
    for (origin, token) in &config.query_token.tokens {
        if origin.trim().is_empty() {
            errors.push(ValidationError::new("query_token.tokens", "contains an empty origin"));
        }
        if token.is_empty() {
            errors.push(ValidationError::new(
                "query_token.tokens",
                format!("token for '{}' is empty", origin),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.server.bind_address = "nowhere".into();
        config.mail.host = " ".into();
        config.mail.port = 0;
        config.templates.marker_attribute = "data bind".into();
        config.whitelist.enable = true;
        config.query_token.enable = true;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "mail.host",
                "mail.port",
                "templates.marker_attribute",
                "whitelist.authorized",
                "query_token.tokens",
            ]
        );
    }

    #[test]
    fn test_invalid_default_from() {
        let mut config = ServiceConfig::default();
        config.mail.default_from = Some("not an address".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "mail.default_from");
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = ServiceConfig::default();
        config.query_token.enable = true;
        config.query_token.tokens.insert("10.0.0.1".into(), String::new());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("10.0.0.1"));
    }
}
