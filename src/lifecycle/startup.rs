//! Startup orchestration.
//!
//! # Responsibilities
//! - Load every route from the template directory
//! - Build the authorization gates from configuration
//! - Resolve mail credentials and build the SMTP transport
//! - Assemble the shared dispatcher
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{resolve_credentials, ConfigError, ServiceConfig};
use crate::dispatch::{DispatchContext, Dispatcher};
use crate::mail::{MailTransport, SmtpTransport, TransportError};
use crate::observability::metrics;
use crate::routing::{load_directory, TemplateLoadError};
use crate::security::AuthorizationGate;
use crate::template::TemplateRenderer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("template error: {0}")]
    Templates(#[from] TemplateLoadError),

    #[error("mail transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Build the dispatch context (registry, gates, renderer) from configuration.
pub fn build_context(config: &ServiceConfig) -> Result<DispatchContext, StartupError> {
    let renderer = TemplateRenderer::new(config.templates.marker_attribute.clone());
    let registry = load_directory(Path::new(&config.templates.directory), &renderer)?;
    metrics::record_routes_loaded(registry.len());

    tracing::info!(
        directory = %config.templates.directory,
        routes = ?registry.names(),
        "Templates loaded"
    );

    Ok(DispatchContext {
        registry,
        gate: AuthorizationGate::from_config(&config.whitelist, &config.query_token),
        renderer,
        default_from: config.mail.default_from.clone(),
    })
}

/// Build a dispatcher around an already constructed transport.
pub fn build_dispatcher_with(
    config: &ServiceConfig,
    transport: Arc<dyn MailTransport>,
) -> Result<Dispatcher, StartupError> {
    Ok(Dispatcher::new(build_context(config)?, transport))
}

/// Build the production dispatcher, sending through SMTP.
pub fn build_dispatcher(config: &ServiceConfig) -> Result<Dispatcher, StartupError> {
    let credentials = resolve_credentials(&config.mail)?;
    let transport = SmtpTransport::from_config(&config.mail, credentials)?;

    tracing::info!(
        host = %config.mail.host,
        port = config.mail.port,
        tls = ?config.mail.tls,
        login = ?config.mail.login_type,
        "Mail transport configured"
    );

    build_dispatcher_with(config, Arc::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::transport::MockMailTransport;
    use std::fs;

    #[test]
    fn test_build_context_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let route = dir.path().join("welcome");
        fs::create_dir(&route).unwrap();
        fs::write(route.join("template.html"), "<p factrice-data=\"name\"></p>").unwrap();
        fs::write(
            route.join("bindings.toml"),
            "[[bindings]]\nmarker = \"name\"\nattribute = \"text\"\n",
        )
        .unwrap();

        let mut config = ServiceConfig::default();
        config.templates.directory = dir.path().to_string_lossy().into_owned();
        config.templates.marker_attribute = "factrice-data".into();
        config.whitelist.enable = true;
        config.whitelist.authorized = vec!["127.0.0.1".into()];

        let context = build_context(&config).unwrap();
        assert_eq!(context.registry.names(), vec!["welcome"]);
        assert_eq!(context.renderer.marker_attribute(), "factrice-data");

        let dispatcher = build_dispatcher_with(&config, Arc::new(MockMailTransport::new()));
        assert!(dispatcher.is_ok());
    }

    #[test]
    fn test_missing_directory_fails() {
        let mut config = ServiceConfig::default();
        config.templates.directory = "/nonexistent/factrice/templates".into();
        assert!(matches!(
            build_context(&config),
            Err(StartupError::Templates(TemplateLoadError::Io { .. }))
        ));
    }
}
