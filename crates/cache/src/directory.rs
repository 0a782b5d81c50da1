use super::errors::CacheError;
use super::models::{DirectoryCache, DirectoryCacheEntry, DirectoryKey, KindCaches};
use arstore_config::{BackendKind, DirectoryCacheSettings};
use arstore_models::ProvisionedPath;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, CacheError>;

fn build_cache(ttl: Duration, max_entries: u64) -> Cache<DirectoryKey, DirectoryCacheEntry> {
    Cache::builder()
        .max_capacity(max_entries)
        .time_to_live(ttl)
        .support_invalidation_closures()
        .build()
}

impl KindCaches {
    fn new(settings: &DirectoryCacheSettings) -> Self {
        Self {
            local_disk: build_cache(settings.ttl_for(BackendKind::LocalDisk), settings.max_entries),
            object_storage: build_cache(settings.ttl_for(BackendKind::ObjectStorage), settings.max_entries),
            cloud_disk: build_cache(settings.ttl_for(BackendKind::CloudDisk), settings.max_entries),
        }
    }

    fn for_kind(&self, kind: BackendKind) -> &Cache<DirectoryKey, DirectoryCacheEntry> {
        match kind {
            BackendKind::LocalDisk => &self.local_disk,
            BackendKind::ObjectStorage => &self.object_storage,
            BackendKind::CloudDisk => &self.cloud_disk,
        }
    }

    fn all(&self) -> [&Cache<DirectoryKey, DirectoryCacheEntry>; 3] {
        [&self.local_disk, &self.object_storage, &self.cloud_disk]
    }
}

impl DirectoryCache {
    pub fn new(settings: &DirectoryCacheSettings) -> Self {
        Self {
            caches: parking_lot::RwLock::new(Arc::new(KindCaches::new(settings))),
        }
    }

    /// Swaps in caches built from new TTL settings. Previous entries are dropped.
    pub fn reconfigure(&self, settings: &DirectoryCacheSettings) {
        *self.caches.write() = Arc::new(KindCaches::new(settings));
        tracing::debug!(
            "Directory cache reconfigured (ttl local={:?} object={:?} cloud={:?})",
            settings.ttl_for(BackendKind::LocalDisk),
            settings.ttl_for(BackendKind::ObjectStorage),
            settings.ttl_for(BackendKind::CloudDisk)
        );
    }

    fn snapshot(&self) -> Arc<KindCaches> {
        Arc::clone(&self.caches.read())
    }

    fn key(adapter_id: &str, path: &ProvisionedPath) -> DirectoryKey {
        DirectoryKey {
            adapter_id: Arc::from(adapter_id),
            path: path.clone(),
        }
    }

    pub async fn get(
        &self,
        kind: BackendKind,
        adapter_id: &str,
        path: &ProvisionedPath,
    ) -> Option<DirectoryCacheEntry> {
        let caches = self.snapshot();
        caches.for_kind(kind).get(&Self::key(adapter_id, path)).await
    }

    /// True when a live entry says the directory exists
    pub async fn is_known(&self, kind: BackendKind, adapter_id: &str, path: &ProvisionedPath) -> bool {
        self.get(kind, adapter_id, path)
            .await
            .is_some_and(|entry| entry.exists)
    }

    /// Records a directory observed or created on the backend.
    /// Absence is never cached, so there is no negative counterpart.
    pub async fn record_exists(&self, kind: BackendKind, adapter_id: &str, path: &ProvisionedPath) {
        let entry = DirectoryCacheEntry {
            exists: true,
            observed_at: chrono::Utc::now(),
        };
        let caches = self.snapshot();
        caches
            .for_kind(kind)
            .insert(Self::key(adapter_id, path), entry)
            .await;
    }

    /// Drops every entry under `company_slug`, on every adapter
    pub fn invalidate_company(&self, company_slug: &str) -> Result<()> {
        let caches = self.snapshot();
        for cache in caches.all() {
            let slug = company_slug.to_string();
            cache.invalidate_entries_if(move |key, _| key.path.is_within(&slug))?;
        }
        Ok(())
    }

    /// Drops every entry recorded through one adapter instance
    pub fn invalidate_adapter(&self, adapter_id: &str) -> Result<()> {
        let caches = self.snapshot();
        for cache in caches.all() {
            let id: Arc<str> = Arc::from(adapter_id);
            cache.invalidate_entries_if(move |key, _| key.adapter_id == id)?;
        }
        Ok(())
    }

    pub fn invalidate_all(&self) {
        let caches = self.snapshot();
        for cache in caches.all() {
            cache.invalidate_all();
        }
    }

    /// Approximate number of live entries across kinds
    pub async fn entry_count(&self) -> u64 {
        let caches = self.snapshot();
        let mut total = 0;
        for cache in caches.all() {
            cache.run_pending_tasks().await;
            total += cache.entry_count();
        }
        total
    }
}
