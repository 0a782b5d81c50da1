use arstore_config::ConfigStore;
use arstore_events::EventBus;
use arstore_manager::StorageManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reloads the routing document when its file changes and invalidates
/// whatever the change affects
pub struct ConfigWatcher {
    pub(super) store: Arc<ConfigStore>,
    pub(super) manager: Arc<StorageManager>,
    pub(super) events: Arc<EventBus>,
    pub(super) config_path: PathBuf,
    pub(super) debounce: Duration,
}
