use arstore_config::ResolvedRoute;
use arstore_storage::{StorageBackend, StorageError};
use std::sync::Arc;

/// Builds adapters for resolved routes
#[async_trait::async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn create(&self, route: &ResolvedRoute) -> Result<Arc<dyn StorageBackend>, StorageError>;
}

/// Production factory backed by the real adapters
pub struct DefaultAdapterFactory;

#[async_trait::async_trait]
impl AdapterFactory for DefaultAdapterFactory {
    async fn create(&self, route: &ResolvedRoute) -> Result<Arc<dyn StorageBackend>, StorageError> {
        arstore_storage::connect(&route.route, route.timeout).await
    }
}
