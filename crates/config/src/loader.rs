use super::defaults::DEFAULT_CONFIG_TEMPLATE;
use super::errors::ConfigError;
use super::migration::migrate_config_if_needed;
use super::models::RoutingDocument;
use super::persistence::ConfigPersistence;
use arstore_events::EventBus;
use arstore_filesystem::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Result<T> = std::result::Result<T, ConfigError>;

/// Routing document stored as a TOML file
pub struct TomlFilePersistence {
    path: PathBuf,
    events: Option<Arc<EventBus>>,
}

impl TomlFilePersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            events: None,
        }
    }

    /// Migration notices go to the event bus
    pub fn with_events<P: AsRef<Path>>(path: P, events: Arc<EventBus>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            events: Some(events),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ConfigPersistence for TomlFilePersistence {
    async fn load(&self) -> Result<Option<RoutingDocument>> {
        // Create default config if it doesn't exist
        if !tokio::fs::try_exists(&self.path).await? {
            create_default_config(&self.path).await?;
        }

        // Migrate config if needed
        migrate_config_if_needed(&self.path, self.events.as_ref()).await?;

        // Read and parse config
        let content = tokio::fs::read_to_string(&self.path).await?;
        let document: RoutingDocument = toml::from_str(&content)?;

        Ok(Some(document))
    }

    async fn save(&self, document: &RoutingDocument) -> Result<()> {
        let content = toml::to_string_pretty(document)?;
        FileSystem::write_synced(&self.path, content.as_bytes()).await?;
        tracing::debug!("Routing configuration written to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Creates a default configuration file
async fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    FileSystem::write_synced(path.as_ref(), DEFAULT_CONFIG_TEMPLATE.as_bytes()).await?;
    Ok(())
}
