mod defaults;
mod diff;
mod errors;
mod loader;
mod migration;
mod models;
mod persistence;
mod routing;
mod store;

pub use defaults::{default_document, DEFAULT_CONFIG_TEMPLATE};
pub use diff::ConfigDiff;
pub use errors::ConfigError;
pub use loader::TomlFilePersistence;
pub use models::*;
pub use persistence::{ConfigPersistence, MemoryPersistence};
pub use store::ConfigStore;
