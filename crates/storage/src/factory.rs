use crate::backend::StorageBackend;
use crate::cloud_disk::CloudDiskBackend;
use crate::local::LocalBackend;
use crate::StorageError;
use arstore_config::{BackendKind, RouteConfig};
use std::sync::Arc;
use std::time::Duration;

/// Builds the adapter selected by `route.backend`.
///
/// Construction failures are returned as-is; no other backend is tried.
pub async fn connect(route: &RouteConfig, timeout: Duration) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match route.backend {
        BackendKind::LocalDisk => Ok(Arc::new(LocalBackend::new(&route.local, timeout).await?)),
        BackendKind::ObjectStorage => connect_object_storage(route, timeout).await,
        BackendKind::CloudDisk => Ok(Arc::new(
            CloudDiskBackend::connect(&route.cloud_disk, timeout).await?,
        )),
    }
}

#[cfg(feature = "s3")]
async fn connect_object_storage(
    route: &RouteConfig,
    timeout: Duration,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Ok(Arc::new(
        crate::s3::S3Backend::new(&route.object_storage, timeout).await?,
    ))
}

#[cfg(not(feature = "s3"))]
async fn connect_object_storage(
    _route: &RouteConfig,
    _timeout: Duration,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Err(StorageError::ConfigError(
        "object_storage backend requires building with the 's3' feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageErrorKind;

    #[tokio::test]
    async fn test_connect_builds_local_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let route = RouteConfig::local_disk(dir.path().to_string_lossy());

        let adapter = connect(&route, Duration::from_secs(1)).await.unwrap();
        assert_eq!(adapter.kind(), BackendKind::LocalDisk);
    }

    #[tokio::test]
    async fn test_cloud_route_without_token_fails_typed() {
        let mut route = RouteConfig::local_disk("unused");
        route.backend = BackendKind::CloudDisk;
        route.cloud_disk.enabled = true;

        let err = connect(&route, Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err.kind(), StorageErrorKind::ConfigInvalid);
    }

    #[cfg(not(feature = "s3"))]
    #[tokio::test]
    async fn test_object_storage_requires_feature() {
        let mut route = RouteConfig::local_disk("unused");
        route.backend = BackendKind::ObjectStorage;

        let err = connect(&route, Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err.kind(), StorageErrorKind::ConfigInvalid);
    }
}
