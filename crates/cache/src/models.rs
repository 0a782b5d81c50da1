use arstore_models::ProvisionedPath;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::future::Cache;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Directory observation for one adapter instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryKey {
    pub adapter_id: Arc<str>,
    pub path: ProvisionedPath,
}

#[derive(Debug, Clone)]
pub struct DirectoryCacheEntry {
    pub exists: bool,
    pub observed_at: DateTime<Utc>,
}

pub(super) struct KindCaches {
    pub(super) local_disk: Cache<DirectoryKey, DirectoryCacheEntry>,
    pub(super) object_storage: Cache<DirectoryKey, DirectoryCacheEntry>,
    pub(super) cloud_disk: Cache<DirectoryKey, DirectoryCacheEntry>,
}

/// TTL cache of directories known to exist, one moka cache per backend kind
pub struct DirectoryCache {
    pub(super) caches: RwLock<Arc<KindCaches>>,
}

pub(super) type LockKey = (Arc<str>, Arc<str>);

/// Async locks serialising hierarchy creation per (adapter, company)
pub struct ProvisionLocks {
    pub(super) locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

/// Held while a company hierarchy is being created; releases and prunes on drop
pub struct ProvisionGuard<'a> {
    pub(super) owner: &'a ProvisionLocks,
    pub(super) key: LockKey,
    pub(super) guard: Option<OwnedMutexGuard<()>>,
}
