use super::errors::ManagerError;
use super::factory::{AdapterFactory, DefaultAdapterFactory};
use super::models::{
    AdapterCache, AdapterHandle, HierarchicalProvisioner, InvalidationReport, StorageManager,
};
use arstore_cache::DirectoryCache;
use arstore_config::{BackendKind, ConfigDiff, ConfigStore};
use arstore_events::{AppEvent, EventBus};
use arstore_models::{CompanyId, RoutingKey};
use arstore_storage::StorageBackend;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type Result<T> = std::result::Result<T, ManagerError>;

impl AdapterHandle {
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// `{kind}:{settings fingerprint}`; equal ids mean identical backend settings
    pub fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn routing_key(&self) -> &RoutingKey {
        &self.routing_key
    }

    /// Same underlying adapter instance
    pub fn ptr_eq(&self, other: &AdapterHandle) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("kind", &self.kind)
            .field("adapter_id", &self.adapter_id)
            .field("company_id", &self.company_id)
            .field("routing_key", &self.routing_key)
            .finish()
    }
}

impl AdapterCache {
    /// Invalidation generation a construction for `company_id` must still see before caching
    pub(super) fn generation(&self, company_id: CompanyId) -> (u64, u64) {
        (
            self.epoch,
            self.company_epochs.get(&company_id).copied().unwrap_or(0),
        )
    }
}

impl StorageManager {
    pub fn new(config: Arc<ConfigStore>, events: Arc<EventBus>) -> Self {
        Self::with_factory(config, Arc::new(DefaultAdapterFactory), events)
    }

    pub fn with_factory(
        config: Arc<ConfigStore>,
        factory: Arc<dyn AdapterFactory>,
        events: Arc<EventBus>,
    ) -> Self {
        let directories = Arc::new(DirectoryCache::new(&config.current().directory_cache));
        Self {
            provisioner: HierarchicalProvisioner::new(Arc::clone(&directories)),
            config,
            factory,
            adapters: Mutex::new(AdapterCache {
                entries: HashMap::new(),
                epoch: 0,
                company_epochs: HashMap::new(),
            }),
            directories,
            events,
            known_slugs: DashMap::new(),
        }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn directories(&self) -> &Arc<DirectoryCache> {
        &self.directories
    }

    /// Adapter for (company, routing key), built on first use and reused while
    /// the resolved backend settings stay the same.
    pub async fn get_adapter(&self, company_id: CompanyId, routing_key: &RoutingKey) -> Result<AdapterHandle> {
        let document = self.config.current();
        let resolved = document.resolve(company_id, routing_key)?;
        let kind = resolved.backend();
        if !document.is_remote_enabled(kind) {
            return Err(ManagerError::BackendDisabled(kind));
        }

        let fingerprint = resolved.route.fingerprint();
        let key = (company_id, routing_key.clone());

        let generation = {
            let cache = self.adapters.lock();
            if let Some(handle) = cache.entries.get(&key) {
                if *handle.fingerprint == *fingerprint {
                    return Ok(handle.clone());
                }
            }
            cache.generation(company_id)
        };

        // Built without holding the lock; a concurrent builder may win the insert
        let backend = self
            .factory
            .create(&resolved)
            .await
            .map_err(|source| ManagerError::Connect {
                backend: kind,
                company: company_id,
                routing_key: routing_key.clone(),
                source,
            })?;

        let handle = AdapterHandle {
            backend,
            kind,
            adapter_id: Arc::from(resolved.route.adapter_id()),
            fingerprint: Arc::from(fingerprint),
            company_id,
            routing_key: routing_key.clone(),
        };

        {
            let mut cache = self.adapters.lock();
            if cache.generation(company_id) != generation {
                // Invalidated while building: hand the adapter out, but don't cache it
                return Ok(handle);
            }
            if let Some(existing) = cache.entries.get(&key) {
                if existing.fingerprint == handle.fingerprint {
                    return Ok(existing.clone());
                }
            }
            cache.entries.insert(key, handle.clone());
        }

        self.events.emit(AppEvent::AdapterCreated {
            company: company_id.to_string(),
            routing_key: routing_key.to_string(),
            backend: kind.to_string(),
        });

        Ok(handle)
    }

    /// Drops cached adapters of one company (optionally a single routing key)
    /// and the cached folders under every slug known for it.
    ///
    /// Lookups that start after this returns never see the dropped handles.
    /// Operations already holding a handle finish on the old backend.
    pub fn invalidate(&self, company_id: CompanyId, routing_key: Option<&RoutingKey>) -> Result<InvalidationReport> {
        let adapters = {
            let mut cache = self.adapters.lock();
            *cache.company_epochs.entry(company_id).or_insert(0) += 1;
            let before = cache.entries.len();
            cache.entries.retain(|(company, key), _| {
                company != &company_id || routing_key.is_some_and(|only| only != key)
            });
            before - cache.entries.len()
        };

        let slugs = self.slugs_for(company_id);
        for slug in &slugs {
            self.directories.invalidate_company(slug)?;
        }

        let report = InvalidationReport {
            adapters,
            slugs: slugs.len(),
        };
        self.events.emit(AppEvent::AdapterInvalidated {
            company: company_id.to_string(),
            adapters: report.adapters,
            directories: report.slugs,
        });
        tracing::debug!(
            company = %company_id,
            adapters = report.adapters,
            slugs = report.slugs,
            "invalidated company storage state"
        );

        Ok(report)
    }

    /// Drops every cached adapter and directory entry
    pub fn invalidate_all(&self) -> usize {
        let adapters = {
            let mut cache = self.adapters.lock();
            cache.epoch += 1;
            let count = cache.entries.len();
            cache.entries.clear();
            count
        };
        self.directories.invalidate_all();

        self.events.emit(AppEvent::AllAdaptersInvalidated { adapters });
        adapters
    }

    /// Invalidates whatever a configuration change affects
    pub fn apply_config_diff(&self, diff: &ConfigDiff) -> Result<()> {
        if diff.settings_changed {
            self.directories
                .reconfigure(&self.config.current().directory_cache);
            self.invalidate_all();
            return Ok(());
        }
        if !diff.changed_routes.is_empty() {
            self.invalidate_all();
            return Ok(());
        }
        for company_id in &diff.changed_companies {
            self.invalidate(*company_id, None)?;
        }
        Ok(())
    }

    /// Number of cached adapter handles
    pub fn cached_adapters(&self) -> usize {
        self.adapters.lock().entries.len()
    }

    pub(super) fn remember_slug(&self, company_id: CompanyId, slug: &str) {
        let mut slugs = self.known_slugs.entry(company_id).or_default();
        if !slugs.contains(slug) {
            slugs.insert(slug.to_string());
        }
    }

    fn slugs_for(&self, company_id: CompanyId) -> Vec<String> {
        let mut slugs: HashSet<String> = self
            .known_slugs
            .get(&company_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        if let Some(profile) = self.config.company(company_id) {
            slugs.insert(profile.slug);
        }
        let mut slugs: Vec<String> = slugs.into_iter().collect();
        slugs.sort();
        slugs
    }
}
