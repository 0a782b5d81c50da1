use super::factory::AdapterFactory;
use arstore_cache::{DirectoryCache, ProvisionLocks};
use arstore_config::{BackendKind, ConfigStore};
use arstore_events::EventBus;
use arstore_models::{CompanyId, RoutingKey};
use arstore_storage::StorageBackend;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Shared reference to one constructed adapter
#[derive(Clone)]
pub struct AdapterHandle {
    pub(super) backend: Arc<dyn StorageBackend>,
    pub(super) kind: BackendKind,
    pub(super) adapter_id: Arc<str>,
    pub(super) fingerprint: Arc<str>,
    pub(super) company_id: CompanyId,
    pub(super) routing_key: RoutingKey,
}

pub(super) type AdapterKey = (CompanyId, RoutingKey);

pub(super) struct AdapterCache {
    pub(super) entries: HashMap<AdapterKey, AdapterHandle>,
    /// Bumped by `invalidate_all` so constructions racing it are not cached
    pub(super) epoch: u64,
    /// Same, per company, for targeted invalidation
    pub(super) company_epochs: HashMap<CompanyId, u64>,
}


/// Creates missing folders of a hierarchy, consulting the directory cache first
pub struct HierarchicalProvisioner {
    pub(super) directories: Arc<DirectoryCache>,
    pub(super) locks: ProvisionLocks,
}

/// Entry point for every storage operation: routes by (company, routing key)
pub struct StorageManager {
    pub(super) config: Arc<ConfigStore>,
    pub(super) factory: Arc<dyn AdapterFactory>,
    pub(super) adapters: Mutex<AdapterCache>,
    pub(super) directories: Arc<DirectoryCache>,
    pub(super) provisioner: HierarchicalProvisioner,
    pub(super) events: Arc<EventBus>,
    /// Slugs seen in provisioning calls, kept for invalidation after a rename
    pub(super) known_slugs: DashMap<CompanyId, HashSet<String>>,
}

/// What one invalidation dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub adapters: usize,
    pub slugs: usize,
}
