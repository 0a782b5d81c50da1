// Re-export all public APIs from the workspace crates

pub use arstore_models::*;
pub use arstore_events::*;
pub use arstore_utils::*;
pub use arstore_filesystem::*;
pub use arstore_config::*;
pub use arstore_storage::*;
pub use arstore_cache::*;
pub use arstore_manager::*;
pub use arstore_watcher::*;

/// Prelude module for convenient imports
pub mod prelude {
    // Core models
    pub use arstore_models::{CompanyId, ProvisionedPath, RoutingKey};

    // Events
    pub use arstore_events::{AppEvent, EventBus};

    // Configuration
    pub use arstore_config::{BackendKind, ConfigStore, RouteConfig, RoutingDocument, TomlFilePersistence};

    // Storage
    pub use arstore_storage::{StorageBackend, StorageError, StorageErrorKind};

    // Routing and provisioning
    pub use arstore_manager::{AdapterHandle, ManagerError, StorageManager};

    // Watcher
    pub use arstore_watcher::ConfigWatcher;
}
