use crate::StorageError;
use arstore_config::BackendKind;
use arstore_models::ProvisionedPath;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;

/// Capability set every storage backend provides.
///
/// Paths are always relative to the adapter's own root (local directory,
/// bucket prefix or cloud folder), so the same [`ProvisionedPath`] works
/// against any implementation.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Stores `data` at `path`, returning the path it was stored under
    async fn save(&self, path: &ProvisionedPath, data: Bytes) -> Result<ProvisionedPath, StorageError>;

    async fn read(&self, path: &ProvisionedPath) -> Result<Bytes, StorageError>;

    async fn delete(&self, path: &ProvisionedPath) -> Result<(), StorageError>;

    /// `Ok(false)` for a missing file; only transport and auth problems are errors
    async fn exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError>;

    /// Direct URL for the object when the backend exposes one
    fn public_url(&self, path: &ProvisionedPath) -> Option<String>;

    async fn directory_exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError>;

    /// Creates one directory level. The parent must exist; an existing
    /// directory is reported as [`StorageError::AlreadyExists`].
    async fn create_directory(&self, path: &ProvisionedPath) -> Result<(), StorageError>;

    /// Check if backend is local or remote
    fn is_remote(&self) -> bool {
        self.kind().is_remote()
    }
}

/// Runs `fut` under `timeout`; an elapsed timer becomes a transport error
pub(crate) async fn bounded<T, F>(timeout: Duration, path: &str, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::transport(
            path,
            format!("operation timed out after {}s", timeout.as_secs_f32()),
        )),
    }
}
