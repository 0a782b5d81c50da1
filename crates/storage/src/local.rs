use crate::backend::{bounded, StorageBackend};
use crate::StorageError;
use arstore_config::{BackendKind, LocalSettings};
use arstore_filesystem::FileSystem;
use arstore_models::ProvisionedPath;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Local filesystem storage backend
pub struct LocalBackend {
    root: PathBuf,
    public_base_url: Option<String>,
    timeout: Duration,
}

impl LocalBackend {
    /// Resolves the root to an absolute path and creates it when missing
    pub async fn new(settings: &LocalSettings, timeout: Duration) -> Result<Self, StorageError> {
        if settings.root_path.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "local.root_path must not be empty".to_string(),
            ));
        }

        let root = FileSystem::ensure_root(Path::new(&settings.root_path))
            .await
            .map_err(|e| StorageError::from_io(&settings.root_path, e))?;

        let public_base_url = match settings.public_base_url.trim_end_matches('/') {
            "" => None,
            base => Some(base.to_string()),
        };

        Ok(Self {
            root,
            public_base_url,
            timeout,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &ProvisionedPath) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.segments() {
            full.push(segment);
        }
        full
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalDisk
    }

    async fn save(&self, path: &ProvisionedPath, data: Bytes) -> Result<ProvisionedPath, StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            FileSystem::write_synced(&full, &data)
                .await
                .map_err(|e| StorageError::from_io(path.as_str(), e))?;
            tracing::debug!("Saved {} bytes to {}", data.len(), full.display());
            Ok(path.clone())
        })
        .await
    }

    async fn read(&self, path: &ProvisionedPath) -> Result<Bytes, StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            let data = tokio::fs::read(&full)
                .await
                .map_err(|e| StorageError::from_io(path.as_str(), e))?;
            Ok(Bytes::from(data))
        })
        .await
    }

    async fn delete(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            tokio::fs::remove_file(&full)
                .await
                .map_err(|e| StorageError::from_io(path.as_str(), e))
        })
        .await
    }

    async fn exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            match tokio::fs::metadata(&full).await {
                Ok(meta) => Ok(meta.is_file()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StorageError::from_io(path.as_str(), e)),
            }
        })
        .await
    }

    fn public_url(&self, path: &ProvisionedPath) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, path))
    }

    async fn directory_exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            FileSystem::is_directory(&full)
                .await
                .map_err(|e| StorageError::from_io(path.as_str(), e))
        })
        .await
    }

    async fn create_directory(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        let full = self.resolve(path);
        bounded(self.timeout, path.as_str(), async {
            FileSystem::create_directory_strict(&full)
                .await
                .map_err(|e| StorageError::from_io(path.as_str(), e))
        })
        .await
    }
}
