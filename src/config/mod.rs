//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → startup builds registry, gates and transport from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credentials may come from the environment instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_credentials, ConfigError, Credentials};
pub use schema::{
    LogFormat, LoginType, MailConfig, ObservabilityConfig, ServerConfig, ServiceConfig,
    TemplatesConfig, TlsMode, TokenConfig, WhitelistConfig,
};
pub use validation::ValidationError;
