//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::DEFAULT_MARKER_ATTRIBUTE;

/// Root configuration for the mail service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Outbound mail server.
    pub mail: MailConfig,

    /// Template directory settings.
    pub templates: TemplatesConfig,

    /// Origin allow-list.
    pub whitelist: WhitelistConfig,

    /// Per-origin query tokens.
    pub query_token: TokenConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Use the first `X-Forwarded-For` entry as the request origin.
    pub trust_forwarded_for: bool,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            trust_forwarded_for: false,
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    #[default]
    Starttls,
    Tls,
    None,
}

/// Where SMTP credentials come from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginType {
    /// `mail.username` / `mail.password`.
    #[default]
    ConfigFile,
    /// `FACTRICE_USERNAME` / `FACTRICE_PASSWORD`.
    EnvironmentVariable,
    /// No authentication.
    None,
}

/// Outbound mail server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub login_type: LoginType,
    pub username: String,
    pub password: String,

    /// Sender used when a request does not carry `from`.
    pub default_from: Option<String>,

    /// SMTP connection/command timeout in seconds.
    pub send_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            tls: TlsMode::default(),
            login_type: LoginType::default(),
            username: String::new(),
            password: String::new(),
            default_from: None,
            send_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("login_type", &self.login_type)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("default_from", &self.default_from)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

/// Template directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory holding one sub-directory per route.
    pub directory: String,

    /// Attribute marking injection points in templates.
    pub marker_attribute: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
        }
    }
}

/// Origin allow-list.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WhitelistConfig {
    pub enable: bool,
    pub authorized: Vec<String>,
}

/// Origin-keyed token table.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TokenConfig {
    pub enable: bool,
    pub tokens: HashMap<String, String>,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("enable", &self.enable)
            .field("origins", &self.tokens.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
