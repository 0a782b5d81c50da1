use arstore_cache::CacheError;
use arstore_config::{BackendKind, ConfigError};
use arstore_models::{CompanyId, PathError, RoutingKey};
use arstore_storage::{StorageError, StorageErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("No route configured for routing key '{0}'")]
    UnknownRoutingKey(String),

    #[error("Backend {0} is globally disabled")]
    BackendDisabled(BackendKind),

    #[error("Failed to build {backend} adapter for company {company} ({routing_key}): {source}")]
    Connect {
        backend: BackendKind,
        company: CompanyId,
        routing_key: RoutingKey,
        #[source]
        source: StorageError,
    },

    #[error("{backend} backend failed on '{path}': {source}")]
    Backend {
        backend: BackendKind,
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Configuration error: {0}")]
    Config(ConfigError),

    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<ConfigError> for ManagerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownRoutingKey(key) => ManagerError::UnknownRoutingKey(key),
            ConfigError::CompanyNotFound(id) => ManagerError::CompanyNotFound(id),
            other => ManagerError::Config(other),
        }
    }
}

impl ManagerError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            ManagerError::Connect { source, .. } | ManagerError::Backend { source, .. } => source.kind(),
            ManagerError::CompanyNotFound(_) => StorageErrorKind::NotFound,
            ManagerError::Cache(_) => StorageErrorKind::Io,
            ManagerError::UnknownRoutingKey(_)
            | ManagerError::BackendDisabled(_)
            | ManagerError::InvalidPath(_)
            | ManagerError::Config(_) => StorageErrorKind::ConfigInvalid,
        }
    }

    /// The adapter error, unchanged, when one caused this failure
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            ManagerError::Connect { source, .. } | ManagerError::Backend { source, .. } => Some(source),
            _ => None,
        }
    }
}
