use super::errors::ConfigError;
use super::models::{
    BackendKind, CompanyProfile, ResolvedRoute, RouteConfig, RouteSource, RoutingDocument,
};
use arstore_models::{validate_segment, CompanyId, RoutingKey};
use std::collections::HashSet;

type Result<T> = std::result::Result<T, ConfigError>;

impl RoutingDocument {
    pub fn route(&self, key: &str) -> Option<&RouteConfig> {
        self.routes.get(key)
    }

    pub fn company(&self, id: CompanyId) -> Option<&CompanyProfile> {
        self.companies.iter().find(|c| c.id == id)
    }

    pub fn company_mut(&mut self, id: CompanyId) -> Result<&mut CompanyProfile> {
        self.companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ConfigError::CompanyNotFound(id))
    }

    pub fn company_by_slug(&self, slug: &str) -> Option<&CompanyProfile> {
        self.companies.iter().find(|c| c.slug == slug)
    }

    /// Company override if present, else the global default for `key`
    pub fn resolve(&self, company_id: CompanyId, key: &RoutingKey) -> Result<ResolvedRoute> {
        let overridden = self
            .company(company_id)
            .and_then(|company| company.routes.get(key));

        let (route, source) = match overridden {
            Some(route) => (route, RouteSource::CompanyOverride),
            None => (
                self.routes
                    .get(key)
                    .ok_or_else(|| ConfigError::UnknownRoutingKey(key.to_string()))?,
                RouteSource::Default,
            ),
        };

        Ok(ResolvedRoute {
            company_id,
            routing_key: key.clone(),
            source,
            route: route.clone(),
            timeout: self.timeouts.for_kind(route.backend),
        })
    }

    pub fn is_remote_enabled(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::LocalDisk => true,
            BackendKind::ObjectStorage => self.remote.object_storage_enabled,
            BackendKind::CloudDisk => self.remote.cloud_disk_enabled,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.routes.is_empty() {
            return Err(ConfigError::InvalidConfig("no routes configured".to_string()));
        }

        for key in self.routes.keys() {
            validate_routing_key(key)?;
        }

        if !self.routes.contains_key(&self.provisioning.routing_key) {
            return Err(ConfigError::InvalidConfig(format!(
                "provisioning.routing_key '{}' has no route",
                self.provisioning.routing_key
            )));
        }

        for kind in BackendKind::ALL {
            for subfolder in self.provisioning.subfolders_for(kind) {
                validate_segment(subfolder)?;
            }
        }

        let mut ids = HashSet::new();
        let mut slugs = HashSet::new();
        for company in &self.companies {
            if !ids.insert(company.id) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate company id {}",
                    company.id
                )));
            }
            validate_segment(&company.slug)?;
            if !slugs.insert(company.slug.as_str()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate company slug '{}'",
                    company.slug
                )));
            }
            for category in &company.categories {
                validate_segment(category)?;
            }
            for key in company.routes.keys() {
                validate_routing_key(key)?;
            }
        }

        Ok(())
    }
}

fn validate_routing_key(key: &RoutingKey) -> Result<()> {
    if key.as_str().trim().is_empty() {
        return Err(ConfigError::InvalidConfig("empty routing key".to_string()));
    }
    Ok(())
}

impl RouteConfig {
    /// Identity of the backend settings this route points at.
    ///
    /// Only the settings of the selected backend participate, so editing an
    /// unused section never forces an adapter rebuild.
    pub fn fingerprint(&self) -> String {
        let kind = self.backend.as_str();
        match self.backend {
            BackendKind::LocalDisk => arstore_utils::fingerprint([
                kind,
                self.local.root_path.as_str(),
                self.local.public_base_url.as_str(),
            ]),
            BackendKind::ObjectStorage => {
                let s = &self.object_storage;
                arstore_utils::fingerprint([
                    kind,
                    s.endpoint.as_str(),
                    s.region.as_str(),
                    s.access_key.as_str(),
                    s.secret_key.as_str(),
                    s.bucket.as_str(),
                    if s.secure { "https" } else { "http" },
                    s.prefix.as_str(),
                    s.public_url.as_str(),
                ])
            }
            BackendKind::CloudDisk => {
                let s = &self.cloud_disk;
                arstore_utils::fingerprint([
                    kind,
                    if s.enabled { "on" } else { "off" },
                    s.oauth_token.as_str(),
                    s.base_path.as_str(),
                    s.api_url.as_str(),
                ])
            }
        }
    }

    /// Settings-level id shared by every route pointing at the same physical location
    pub fn adapter_id(&self) -> String {
        format!("{}:{}", self.backend, self.fingerprint())
    }
}
