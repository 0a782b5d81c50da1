use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Config error: {0}")]
    ConfigError(#[from] arstore_config::ConfigError),

    #[error("Storage manager error: {0}")]
    ManagerError(#[from] arstore_manager::ManagerError),

    #[error("Notify error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error("Watch operation failed: {0}")]
    WatchFailed(String),
}
