use super::errors::WatcherError;
use super::models::ConfigWatcher;
use arstore_config::{ConfigDiff, ConfigStore};
use arstore_events::{AppEvent, EventBus};
use arstore_manager::StorageManager;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, WatcherError>;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const CHANNEL_SIZE: usize = 16;

impl ConfigWatcher {
    pub fn new(
        store: Arc<ConfigStore>,
        manager: Arc<StorageManager>,
        events: Arc<EventBus>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            manager,
            events,
            config_path: config_path.into(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn start_watching(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.watch_config_file().await {
                tracing::error!("Config watcher error: {}", e);
            }
        })
    }

    async fn watch_config_file(&self) -> Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::channel(CHANNEL_SIZE);

        // Saves replace the file by rename, so watch the directory and filter by name
        let file_name = self
            .config_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| {
                WatcherError::WatchFailed(format!("{} is not a file path", self.config_path.display()))
            })?;
        let directory = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher: RecommendedWatcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let relevant = matches!(
                        event.kind,
                        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if relevant {
                        let _ = tx.try_send(());
                    }
                }
            },
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching {} for routing changes", self.config_path.display());

        while rx.recv().await.is_some() {
            tokio::time::sleep(self.debounce).await;
            // Coalesce the burst of events a single save produces
            while rx.try_recv().is_ok() {}

            if !Path::new(&self.config_path).exists() {
                tracing::warn!("Config file deleted, keeping current configuration");
                continue;
            }

            if let Err(e) = self.apply_reload().await {
                self.events.emit(AppEvent::ConfigError {
                    error: e.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Re-reads the document and invalidates what changed.
    /// On error the previous configuration stays active.
    pub async fn apply_reload(&self) -> Result<ConfigDiff> {
        let diff = self.store.reload().await?;
        if diff.is_empty() {
            return Ok(diff);
        }

        self.manager.apply_config_diff(&diff)?;

        self.events.emit(AppEvent::ConfigReloaded {
            changed_routes: diff.changed_routes.iter().map(|k| k.to_string()).collect(),
            changed_companies: diff.changed_companies.len(),
        });

        // New or edited companies get their folders right away
        for company_id in &diff.changed_companies {
            if self.store.company(*company_id).is_none() {
                continue;
            }
            if let Err(e) = self.manager.provision_company(*company_id).await {
                self.events.emit(AppEvent::Error {
                    context: format!("Provisioning company {} after reload", company_id),
                    error: e.to_string(),
                });
            }
        }

        Ok(diff)
    }
}
