//! Configuration loading from disk.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::schema::{LoginType, MailConfig, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const USERNAME_ENV: &str = "FACTRICE_USERNAME";
pub const PASSWORD_ENV: &str = "FACTRICE_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    MissingEnv(&'static str),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::MissingEnv(var) => write!(f, "Environment variable {} is not set", var),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// SMTP credentials resolved from the configured login source.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Resolve SMTP credentials, reading the environment when configured to.
pub fn resolve_credentials(mail: &MailConfig) -> Result<Option<Credentials>, ConfigError> {
    match mail.login_type {
        LoginType::None => Ok(None),
        LoginType::ConfigFile => Ok(Some(Credentials {
            username: mail.username.clone(),
            password: mail.password.clone(),
        })),
        LoginType::EnvironmentVariable => {
            let username =
                env::var(USERNAME_ENV).map_err(|_| ConfigError::MissingEnv(USERNAME_ENV))?;
            let password =
                env::var(PASSWORD_ENV).map_err(|_| ConfigError::MissingEnv(PASSWORD_ENV))?;
            Ok(Some(Credentials { username, password }))
        }
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factrice.toml");
        fs::write(
            &path,
            r#"
                [mail]
                host = "smtp.example.com"
                username = "mailer"
                password = "pw"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.mail.host, "smtp.example.com");
        let credentials = resolve_credentials(&config.mail).unwrap().unwrap();
        assert_eq!(credentials.username, "mailer");
        assert_eq!(credentials.password, "pw");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/factrice.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[server\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_config("[mail]\nport = 0\nhost = \"\"").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("mail.host"));
        assert!(msg.contains("mail.port"));
    }

    #[test]
    fn test_no_login() {
        let mail = MailConfig {
            login_type: LoginType::None,
            ..MailConfig::default()
        };
        assert_eq!(resolve_credentials(&mail).unwrap(), None);
    }
}
