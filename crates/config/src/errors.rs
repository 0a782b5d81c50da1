use arstore_models::{CompanyId, PathError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("TOML edit error: {0}")]
    TomlEditError(#[from] toml_edit::TomlError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid path in configuration: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Migration failed: {0}")]
    MigrationError(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    #[error("No route configured for routing key '{0}'")]
    UnknownRoutingKey(String),
}
