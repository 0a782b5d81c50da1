use arstore_models::{CompanyId, RoutingKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Physical storage technology behind a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    LocalDisk,
    ObjectStorage,
    CloudDisk,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::LocalDisk,
        BackendKind::ObjectStorage,
        BackendKind::CloudDisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalDisk => "local_disk",
            BackendKind::ObjectStorage => "object_storage",
            BackendKind::CloudDisk => "cloud_disk",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, BackendKind::LocalDisk)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted routing document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoutingDocument {
    #[serde(default = "super::defaults::document_version")]
    pub version: u32,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub directory_cache: DirectoryCacheSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub provisioning: ProvisioningSettings,
    #[serde(default)]
    pub routes: BTreeMap<RoutingKey, RouteConfig>,
    #[serde(default)]
    pub companies: Vec<CompanyProfile>,
}

/// Per-kind bound on every adapter operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutSettings {
    #[serde(default = "super::defaults::local_disk_timeout_secs")]
    pub local_disk_secs: u64,
    #[serde(default = "super::defaults::object_storage_timeout_secs")]
    pub object_storage_secs: u64,
    #[serde(default = "super::defaults::cloud_disk_timeout_secs")]
    pub cloud_disk_secs: u64,
}

impl TimeoutSettings {
    pub fn for_kind(&self, kind: BackendKind) -> Duration {
        let secs = match kind {
            BackendKind::LocalDisk => self.local_disk_secs,
            BackendKind::ObjectStorage => self.object_storage_secs,
            BackendKind::CloudDisk => self.cloud_disk_secs,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectoryCacheSettings {
    #[serde(default = "super::defaults::local_disk_ttl_secs")]
    pub local_disk_ttl_secs: u64,
    #[serde(default = "super::defaults::object_storage_ttl_secs")]
    pub object_storage_ttl_secs: u64,
    #[serde(default = "super::defaults::cloud_disk_ttl_secs")]
    pub cloud_disk_ttl_secs: u64,
    #[serde(default = "super::defaults::directory_cache_max_entries")]
    pub max_entries: u64,
}

impl DirectoryCacheSettings {
    pub fn ttl_for(&self, kind: BackendKind) -> Duration {
        let secs = match kind {
            BackendKind::LocalDisk => self.local_disk_ttl_secs,
            BackendKind::ObjectStorage => self.object_storage_ttl_secs,
            BackendKind::CloudDisk => self.cloud_disk_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Global switches checked before a remote adapter is built
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteSettings {
    #[serde(default = "super::defaults::remote_enabled")]
    pub object_storage_enabled: bool,
    #[serde(default = "super::defaults::remote_enabled")]
    pub cloud_disk_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProvisioningSettings {
    #[serde(default = "super::defaults::provisioning_routing_key")]
    pub routing_key: RoutingKey,
    #[serde(default)]
    pub subfolders: SubfolderSettings,
}

impl ProvisioningSettings {
    pub fn subfolders_for(&self, kind: BackendKind) -> &[String] {
        match kind {
            BackendKind::LocalDisk => &self.subfolders.local_disk,
            BackendKind::ObjectStorage => &self.subfolders.object_storage,
            BackendKind::CloudDisk => &self.subfolders.cloud_disk,
        }
    }
}

/// Order subfolders created when the caller does not name any
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubfolderSettings {
    #[serde(default = "super::defaults::local_disk_subfolders")]
    pub local_disk: Vec<String>,
    #[serde(default = "super::defaults::object_storage_subfolders")]
    pub object_storage: Vec<String>,
    #[serde(default = "super::defaults::cloud_disk_subfolders")]
    pub cloud_disk: Vec<String>,
}

/// Backend selection for one routing key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    pub backend: BackendKind,
    #[serde(default)]
    pub local: LocalSettings,
    #[serde(default)]
    pub object_storage: ObjectStorageSettings,
    #[serde(default)]
    pub cloud_disk: CloudDiskSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalSettings {
    #[serde(default = "super::defaults::local_root_path")]
    pub root_path: String,
    /// Base URL the root is served under; empty = not publicly exposed
    #[serde(default)]
    pub public_base_url: String,
}

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObjectStorageSettings {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "super::defaults::object_storage_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "super::defaults::object_storage_secure")]
    pub secure: bool,
    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub public_url: String,
}

impl fmt::Debug for ObjectStorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorageSettings")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("secure", &self.secure)
            .field("prefix", &self.prefix)
            .field("public_url", &self.public_url)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CloudDiskSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub oauth_token: String,
    #[serde(default = "super::defaults::cloud_disk_base_path")]
    pub base_path: String,
    #[serde(default = "super::defaults::cloud_disk_api_url")]
    pub api_url: String,
    /// Probe the disk with the token while building the adapter
    #[serde(default)]
    pub verify_on_connect: bool,
}

impl fmt::Debug for CloudDiskSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudDiskSettings")
            .field("enabled", &self.enabled)
            .field("oauth_token", &"<redacted>")
            .field("base_path", &self.base_path)
            .field("api_url", &self.api_url)
            .field("verify_on_connect", &self.verify_on_connect)
            .finish()
    }
}

/// Tenant storage profile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompanyProfile {
    pub id: CompanyId,
    pub slug: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Per-key overrides replacing the global default route
    #[serde(default)]
    pub routes: BTreeMap<RoutingKey, RouteConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Default,
    CompanyOverride,
}

/// Effective route for one (company, routing key) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub company_id: CompanyId,
    pub routing_key: RoutingKey,
    pub source: RouteSource,
    pub route: RouteConfig,
    pub timeout: Duration,
}

impl ResolvedRoute {
    pub fn backend(&self) -> BackendKind {
        self.route.backend
    }
}
