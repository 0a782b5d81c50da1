use arstore_config::{ConfigStore, TomlFilePersistence};
use arstore_events::{AppEvent, EventBus};
use arstore_filesystem::FileSystem;
use anyhow::Result;
use std::sync::Arc;

pub async fn load(config_path: &str, events: &Arc<EventBus>) -> Result<Arc<ConfigStore>> {
    let abs_config_path = FileSystem::get_absolute_path_string(config_path)?;

    events.emit(AppEvent::ConfigLoading {
        path: abs_config_path.clone(),
    });

    let config_exists = tokio::fs::try_exists(config_path).await.unwrap_or(false);
    let persistence = TomlFilePersistence::with_events(config_path, Arc::clone(events));
    let store = ConfigStore::open(Arc::new(persistence)).await;

    if !config_exists {
        events.emit(AppEvent::ConfigCreated {
            path: abs_config_path,
        });
    }

    if let Some(reason) = store.degraded_reason() {
        events.emit(AppEvent::ConfigCorrupt { error: reason });
    }

    let document = store.current();
    events.emit(AppEvent::ConfigLoaded {
        routes_count: document.routes.len(),
        companies_count: document.companies.len(),
    });

    Ok(Arc::new(store))
}
