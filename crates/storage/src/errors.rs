use std::io;
use thiserror::Error;

/// ENOSPC on Linux and macOS
#[cfg(unix)]
const NO_SPACE_LEFT: i32 = 28;

/// Coarse classification shared by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    NotFound,
    Auth,
    Transport,
    QuotaExceeded,
    ConfigInvalid,
    AlreadyExists,
    Io,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed for '{path}': {reason}")]
    AuthError { path: String, reason: String },

    #[error("Transport error for '{path}': {reason}")]
    Transport { path: String, reason: String },

    #[error("Storage quota exceeded while writing '{0}'")]
    QuotaExceeded(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage configuration: {0}")]
    ConfigError(String),

    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::NotFound(_) => StorageErrorKind::NotFound,
            StorageError::AuthError { .. } => StorageErrorKind::Auth,
            StorageError::Transport { .. } => StorageErrorKind::Transport,
            StorageError::QuotaExceeded(_) => StorageErrorKind::QuotaExceeded,
            StorageError::AlreadyExists(_) => StorageErrorKind::AlreadyExists,
            StorageError::ConfigError(_) => StorageErrorKind::ConfigInvalid,
            StorageError::IoError { .. } => StorageErrorKind::Io,
        }
    }

    /// Maps a local filesystem error onto the shared taxonomy
    pub fn from_io(path: &str, err: io::Error) -> Self {
        #[cfg(unix)]
        if err.raw_os_error() == Some(NO_SPACE_LEFT) {
            return StorageError::QuotaExceeded(path.to_string());
        }

        match err.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
            io::ErrorKind::TimedOut => StorageError::Transport {
                path: path.to_string(),
                reason: err.to_string(),
            },
            _ => StorageError::IoError {
                path: path.to_string(),
                source: err,
            },
        }
    }

    pub(crate) fn transport(path: &str, reason: impl ToString) -> Self {
        StorageError::Transport {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn auth(path: &str, reason: impl ToString) -> Self {
        StorageError::AuthError {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
