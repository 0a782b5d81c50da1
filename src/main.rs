mod bootstrap;

use arstore_events::{AppEvent, EventBus};
use arstore_filesystem::FileSystem;
use arstore_manager::StorageManager;
use arstore_watcher::ConfigWatcher;
use crate::bootstrap::{config, logging, server};
use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::initialize();

    let events = EventBus::new(false);
    events.emit(AppEvent::Starting);

    let config_path = std::env::var("ARSTORE_CONFIG").unwrap_or_else(|_| "storage.toml".to_string());
    let store = config::load(&config_path, &events).await?;

    let manager = Arc::new(StorageManager::new(Arc::clone(&store), Arc::clone(&events)));

    server::initialize_folders(&manager, &events).await;

    let config_watcher = Arc::new(ConfigWatcher::new(
        Arc::clone(&store),
        Arc::clone(&manager),
        Arc::clone(&events),
        &config_path,
    ));
    let config_watcher_handle = config_watcher.start_watching();

    events.emit(AppEvent::Ready {
        config_path: FileSystem::get_absolute_path_string(&config_path)?,
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, initiating graceful shutdown...");

    // Graceful shutdown: wait for config watcher to stop
    config_watcher_handle.abort();
    let _ = config_watcher_handle.await;

    events.emit(AppEvent::Shutdown);
    Ok(())
}
