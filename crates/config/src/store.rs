use super::defaults::default_document;
use super::diff::ConfigDiff;
use super::errors::ConfigError;
use super::models::{BackendKind, CompanyProfile, ResolvedRoute, RouteConfig, RoutingDocument};
use super::persistence::ConfigPersistence;
use arstore_models::{validate_segment, CompanyId, RoutingKey};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

type Result<T> = std::result::Result<T, ConfigError>;

/// Copy-on-write holder of the routing document.
///
/// Readers take an `Arc` snapshot and never observe a half-applied change:
/// writers build a new document, persist it, then swap the pointer.
pub struct ConfigStore {
    persistence: Arc<dyn ConfigPersistence>,
    current: RwLock<Arc<RoutingDocument>>,
    write_lock: Mutex<()>,
    degraded: RwLock<Option<String>>,
}

impl ConfigStore {
    /// Loads the persisted document. Never fails: a missing document is
    /// replaced by the default one, a corrupt one by an in-memory default.
    pub async fn open(persistence: Arc<dyn ConfigPersistence>) -> Self {
        let (document, degraded) = match persistence.load().await {
            Ok(Some(document)) => match document.validate() {
                Ok(()) => (document, None),
                Err(e) => {
                    tracing::error!(
                        "Routing configuration at {} is invalid, falling back to defaults: {}",
                        persistence.describe(),
                        e
                    );
                    (default_document(), Some(e.to_string()))
                }
            },
            Ok(None) => {
                let document = default_document();
                if let Err(e) = persistence.save(&document).await {
                    tracing::warn!(
                        "Failed to persist default routing configuration to {}: {}",
                        persistence.describe(),
                        e
                    );
                }
                (document, None)
            }
            Err(e) => {
                tracing::error!(
                    "Routing configuration at {} is corrupt, falling back to defaults: {}",
                    persistence.describe(),
                    e
                );
                (default_document(), Some(e.to_string()))
            }
        };

        Self {
            persistence,
            current: RwLock::new(Arc::new(document)),
            write_lock: Mutex::new(()),
            degraded: RwLock::new(degraded),
        }
    }

    /// Wraps an already-built document without touching persistence
    pub fn from_document(document: RoutingDocument, persistence: Arc<dyn ConfigPersistence>) -> Self {
        Self {
            persistence,
            current: RwLock::new(Arc::new(document)),
            write_lock: Mutex::new(()),
            degraded: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Arc<RoutingDocument> {
        Arc::clone(&self.current.read())
    }

    pub fn route(&self, key: &str) -> Option<RouteConfig> {
        self.current().route(key).cloned()
    }

    pub fn company(&self, id: CompanyId) -> Option<CompanyProfile> {
        self.current().company(id).cloned()
    }

    pub fn resolve(&self, company_id: CompanyId, key: &RoutingKey) -> Result<ResolvedRoute> {
        self.current().resolve(company_id, key)
    }

    pub fn is_remote_enabled(&self, kind: BackendKind) -> bool {
        self.current().is_remote_enabled(kind)
    }

    /// True while running on a fallback document because the persisted one was unusable
    pub fn is_degraded(&self) -> bool {
        self.degraded.read().is_some()
    }

    pub fn degraded_reason(&self) -> Option<String> {
        self.degraded.read().clone()
    }

    pub fn describe(&self) -> String {
        self.persistence.describe()
    }

    /// Applies `mutate` to a copy of the current document, validates and
    /// persists it, and only then makes it visible to readers.
    pub async fn update<F>(&self, mutate: F) -> Result<ConfigDiff>
    where
        F: FnOnce(&mut RoutingDocument) -> Result<()>,
    {
        let _guard = self.write_lock.lock().await;

        let old = self.current();
        let mut next = (*old).clone();
        mutate(&mut next)?;
        next.validate()?;

        self.persistence.save(&next).await?;

        let diff = ConfigDiff::between(&old, &next);
        *self.current.write() = Arc::new(next);
        *self.degraded.write() = None;
        Ok(diff)
    }

    /// Re-reads the persisted document. On failure the current document stays active.
    pub async fn reload(&self) -> Result<ConfigDiff> {
        let _guard = self.write_lock.lock().await;

        let next = self
            .persistence
            .load()
            .await?
            .ok_or_else(|| ConfigError::InvalidConfig("routing document disappeared".to_string()))?;
        next.validate()?;

        let old = self.current();
        let diff = ConfigDiff::between(&old, &next);
        *self.current.write() = Arc::new(next);
        *self.degraded.write() = None;
        Ok(diff)
    }

    pub async fn set_default_route(&self, key: RoutingKey, route: RouteConfig) -> Result<ConfigDiff> {
        self.update(move |doc| {
            doc.routes.insert(key, route);
            Ok(())
        })
        .await
    }

    pub async fn set_company_override(
        &self,
        company_id: CompanyId,
        key: RoutingKey,
        route: RouteConfig,
    ) -> Result<ConfigDiff> {
        self.update(move |doc| {
            doc.company_mut(company_id)?.routes.insert(key, route);
            Ok(())
        })
        .await
    }

    pub async fn clear_company_override(&self, company_id: CompanyId, key: &RoutingKey) -> Result<ConfigDiff> {
        self.update(|doc| {
            doc.company_mut(company_id)?.routes.remove(key);
            Ok(())
        })
        .await
    }

    /// Creates the profile or replaces slug and categories of an existing one.
    /// Existing route overrides are kept when `profile.routes` is empty.
    pub async fn upsert_company(&self, profile: CompanyProfile) -> Result<ConfigDiff> {
        self.update(move |doc| {
            match doc.companies.iter_mut().find(|c| c.id == profile.id) {
                Some(existing) => {
                    existing.slug = profile.slug;
                    existing.categories = profile.categories;
                    if !profile.routes.is_empty() {
                        existing.routes = profile.routes;
                    }
                }
                None => doc.companies.push(profile),
            }
            Ok(())
        })
        .await
    }

    pub async fn add_category(&self, company_id: CompanyId, category: &str) -> Result<ConfigDiff> {
        validate_segment(category)?;
        self.update(|doc| {
            let company = doc.company_mut(company_id)?;
            if !company.categories.iter().any(|c| c == category) {
                company.categories.push(category.to_string());
            }
            Ok(())
        })
        .await
    }

    pub async fn remove_category(&self, company_id: CompanyId, category: &str) -> Result<ConfigDiff> {
        self.update(|doc| {
            doc.company_mut(company_id)?.categories.retain(|c| c != category);
            Ok(())
        })
        .await
    }

    /// Deletes the profile. Stored content is not touched.
    pub async fn remove_company(&self, company_id: CompanyId) -> Result<ConfigDiff> {
        self.update(|doc| {
            let before = doc.companies.len();
            doc.companies.retain(|c| c.id != company_id);
            if doc.companies.len() == before {
                return Err(ConfigError::CompanyNotFound(company_id));
            }
            Ok(())
        })
        .await
    }
}
