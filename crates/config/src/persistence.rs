use super::errors::ConfigError;
use super::models::RoutingDocument;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

type Result<T> = std::result::Result<T, ConfigError>;

/// Where the routing document lives between restarts
#[async_trait::async_trait]
pub trait ConfigPersistence: Send + Sync {
    /// `Ok(None)` when no document has been stored yet.
    /// A document that exists but cannot be parsed is an error.
    async fn load(&self) -> Result<Option<RoutingDocument>>;

    /// Returns only once the document is durable
    async fn save(&self, document: &RoutingDocument) -> Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// In-memory persistence holding the serialized TOML text
pub struct MemoryPersistence {
    content: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self {
            content: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Starts from raw text, which does not have to be valid
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn content(&self) -> Option<String> {
        self.content.lock().clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        *self.content.lock() = Some(content.into());
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigPersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<RoutingDocument>> {
        let content = self.content.lock().clone();
        match content {
            Some(text) => Ok(Some(toml::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, document: &RoutingDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory persistence configured to fail",
            )));
        }
        let text = toml::to_string_pretty(document)?;
        *self.content.lock() = Some(text);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
