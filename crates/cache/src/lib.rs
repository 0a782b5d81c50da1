mod directory;
mod errors;
mod locks;
mod models;

pub use errors::CacheError;
pub use models::{DirectoryCache, DirectoryCacheEntry, DirectoryKey, ProvisionGuard, ProvisionLocks};
