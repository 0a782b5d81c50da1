use super::errors::ManagerError;
use super::models::{AdapterHandle, StorageManager};
use arstore_models::{CompanyId, ProvisionedPath, RoutingKey};
use arstore_storage::{StorageError, StorageErrorKind};
use bytes::Bytes;

type Result<T> = std::result::Result<T, ManagerError>;

/// Logs the outcome of one adapter call and wraps its error with backend and path
fn finish<T>(
    operation: &'static str,
    handle: &AdapterHandle,
    path: &ProvisionedPath,
    result: std::result::Result<T, StorageError>,
) -> Result<T> {
    match result {
        Ok(value) => {
            tracing::debug!(
                company = %handle.company_id(),
                routing_key = %handle.routing_key(),
                backend = %handle.kind(),
                path = %path,
                outcome = "ok",
                "{}",
                operation
            );
            Ok(value)
        }
        Err(source) => {
            tracing::warn!(
                company = %handle.company_id(),
                routing_key = %handle.routing_key(),
                backend = %handle.kind(),
                path = %path,
                outcome = ?source.kind(),
                error = %source,
                "{}",
                operation
            );
            Err(ManagerError::Backend {
                backend: handle.kind(),
                path: path.to_string(),
                source,
            })
        }
    }
}

impl StorageManager {
    pub async fn save_file(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
        data: Bytes,
    ) -> Result<ProvisionedPath> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        let result = handle.backend().save(path, data).await;
        finish("save_file", &handle, path, result)
    }

    pub async fn get_file(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<Bytes> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        let result = handle.backend().read(path).await;
        finish("get_file", &handle, path, result)
    }

    pub async fn delete_file(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<()> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        let result = handle.backend().delete(path).await;
        finish("delete_file", &handle, path, result)
    }

    /// Like [`delete_file`](Self::delete_file) but a missing file is `Ok(false)`
    pub async fn delete_file_if_exists(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<bool> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        let result = match handle.backend().delete(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == StorageErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        };
        finish("delete_file_if_exists", &handle, path, result)
    }

    pub async fn file_exists(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<bool> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        let result = handle.backend().exists(path).await;
        finish("file_exists", &handle, path, result)
    }

    pub async fn public_url(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<Option<String>> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        Ok(handle.backend().public_url(path))
    }

    /// Answers from the directory cache while a positive entry is fresh,
    /// otherwise asks the backend and caches a positive answer
    pub async fn directory_exists(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        path: &ProvisionedPath,
    ) -> Result<bool> {
        let handle = self.get_adapter(company_id, routing_key).await?;
        if self
            .directories
            .is_known(handle.kind(), handle.adapter_id(), path)
            .await
        {
            return finish("directory_exists", &handle, path, Ok(true));
        }

        let result = handle.backend().directory_exists(path).await;
        if let Ok(true) = result {
            self.directories
                .record_exists(handle.kind(), handle.adapter_id(), path)
                .await;
        }
        finish("directory_exists", &handle, path, result)
    }
}
