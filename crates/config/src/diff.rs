use super::models::RoutingDocument;
use arstore_models::{CompanyId, RoutingKey};
use std::collections::BTreeSet;

/// What changed between two routing documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    /// Default routes added, removed or modified
    pub changed_routes: Vec<RoutingKey>,
    /// Company profiles added, removed or modified
    pub changed_companies: Vec<CompanyId>,
    /// Timeouts, cache TTLs, remote switches or provisioning settings changed
    pub settings_changed: bool,
}

impl ConfigDiff {
    pub fn between(old: &RoutingDocument, new: &RoutingDocument) -> Self {
        let keys: BTreeSet<&RoutingKey> = old.routes.keys().chain(new.routes.keys()).collect();
        let changed_routes = keys
            .into_iter()
            .filter(|key| old.routes.get(*key) != new.routes.get(*key))
            .cloned()
            .collect();

        let ids: BTreeSet<CompanyId> = old
            .companies
            .iter()
            .chain(new.companies.iter())
            .map(|c| c.id)
            .collect();
        let changed_companies = ids
            .into_iter()
            .filter(|id| old.company(*id) != new.company(*id))
            .collect();

        let settings_changed = old.timeouts != new.timeouts
            || old.directory_cache != new.directory_cache
            || old.remote != new.remote
            || old.provisioning != new.provisioning;

        Self {
            changed_routes,
            changed_companies,
            settings_changed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_routes.is_empty() && self.changed_companies.is_empty() && !self.settings_changed
    }
}
