/// Default values for configuration fields
use super::models::{
    BackendKind, CloudDiskSettings, DirectoryCacheSettings, LocalSettings, ObjectStorageSettings,
    ProvisioningSettings, RemoteSettings, RouteConfig, RoutingDocument, SubfolderSettings,
    TimeoutSettings,
};
use arstore_models::RoutingKey;
use std::collections::BTreeMap;

pub const CURRENT_VERSION: u32 = 2;

pub fn document_version() -> u32 {
    CURRENT_VERSION
}

// Timeouts: remote backends get more room than the local disk
pub fn local_disk_timeout_secs() -> u64 {
    10
}

pub fn object_storage_timeout_secs() -> u64 {
    30
}

pub fn cloud_disk_timeout_secs() -> u64 {
    60
}

// Directory cache TTLs
pub fn local_disk_ttl_secs() -> u64 {
    60
}

pub fn object_storage_ttl_secs() -> u64 {
    120
}

pub fn cloud_disk_ttl_secs() -> u64 {
    300 // Cloud disk calls are slow and rate limited
}

pub fn directory_cache_max_entries() -> u64 {
    100_000
}

pub fn remote_enabled() -> bool {
    true
}

pub fn provisioning_routing_key() -> RoutingKey {
    RoutingKey::portraits()
}

pub fn local_disk_subfolders() -> Vec<String> {
    ["Image", "QR", "nft_markers", "nft_cache"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn object_storage_subfolders() -> Vec<String> {
    vec!["Image".to_string()]
}

pub fn cloud_disk_subfolders() -> Vec<String> {
    vec!["Image".to_string(), "QR".to_string()]
}

// Backend settings
pub fn local_root_path() -> String {
    "storage".to_string()
}

pub fn object_storage_region() -> String {
    "us-east-1".to_string()
}

pub fn object_storage_secure() -> bool {
    true
}

pub fn cloud_disk_base_path() -> String {
    "ar-portal".to_string()
}

pub fn cloud_disk_api_url() -> String {
    "https://cloud-api.yandex.net/v1/disk".to_string()
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            local_disk_secs: local_disk_timeout_secs(),
            object_storage_secs: object_storage_timeout_secs(),
            cloud_disk_secs: cloud_disk_timeout_secs(),
        }
    }
}

impl Default for DirectoryCacheSettings {
    fn default() -> Self {
        Self {
            local_disk_ttl_secs: local_disk_ttl_secs(),
            object_storage_ttl_secs: object_storage_ttl_secs(),
            cloud_disk_ttl_secs: cloud_disk_ttl_secs(),
            max_entries: directory_cache_max_entries(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            object_storage_enabled: remote_enabled(),
            cloud_disk_enabled: remote_enabled(),
        }
    }
}

impl Default for SubfolderSettings {
    fn default() -> Self {
        Self {
            local_disk: local_disk_subfolders(),
            object_storage: object_storage_subfolders(),
            cloud_disk: cloud_disk_subfolders(),
        }
    }
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            routing_key: provisioning_routing_key(),
            subfolders: SubfolderSettings::default(),
        }
    }
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            root_path: local_root_path(),
            public_base_url: String::new(),
        }
    }
}

impl Default for ObjectStorageSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: object_storage_region(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            secure: object_storage_secure(),
            prefix: String::new(),
            public_url: String::new(),
        }
    }
}

impl Default for CloudDiskSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            oauth_token: String::new(),
            base_path: cloud_disk_base_path(),
            api_url: cloud_disk_api_url(),
            verify_on_connect: false,
        }
    }
}

impl RouteConfig {
    pub fn local_disk(root_path: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::LocalDisk,
            local: LocalSettings {
                root_path: root_path.into(),
                public_base_url: String::new(),
            },
            object_storage: ObjectStorageSettings::default(),
            cloud_disk: CloudDiskSettings::default(),
        }
    }
}

/// Every built-in content type routed to the local disk
pub fn default_document() -> RoutingDocument {
    let routes: BTreeMap<RoutingKey, RouteConfig> = RoutingKey::BUILTIN
        .into_iter()
        .map(|key| (RoutingKey::new(key), RouteConfig::local_disk(local_root_path())))
        .collect();

    RoutingDocument {
        version: CURRENT_VERSION,
        timeouts: TimeoutSettings::default(),
        directory_cache: DirectoryCacheSettings::default(),
        remote: RemoteSettings::default(),
        provisioning: ProvisioningSettings::default(),
        routes,
        companies: Vec::new(),
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ===============================================================================
# arstore routing configuration
# ===============================================================================
version = 2

[timeouts]
local_disk_secs = 10                 # Bound on every local disk operation
object_storage_secs = 30             # Bound on every S3-compatible call
cloud_disk_secs = 60                 # Bound on every cloud disk call

[directory_cache]
local_disk_ttl_secs = 60             # How long a known folder is trusted (local disk)
object_storage_ttl_secs = 120        # ... (object storage)
cloud_disk_ttl_secs = 300            # ... (cloud disk, slow + rate limited)
max_entries = 100000                 # Max cached folders per backend kind

[remote]
object_storage_enabled = true        # false = refuse to build object storage adapters
cloud_disk_enabled = true            # false = refuse to build cloud disk adapters

[provisioning]
routing_key = "portraits"            # Content type whose backend hosts order folders

[provisioning.subfolders]
local_disk = ["Image", "QR", "nft_markers", "nft_cache"]
object_storage = ["Image"]
cloud_disk = ["Image", "QR"]

# ===============================================================================
# DEFAULT ROUTES (one per content type)
# ===============================================================================
# backend = "local_disk" | "object_storage" | "cloud_disk"
#
# [routes.<key>.object_storage]
# endpoint = "minio:9000"  region = "us-east-1"  access_key = ""  secret_key = ""
# bucket = ""  secure = true  prefix = ""  public_url = ""
#
# [routes.<key>.cloud_disk]
# enabled = false  oauth_token = ""  base_path = "ar-portal"  verify_on_connect = false

[routes.portraits]
backend = "local_disk"

[routes.portraits.local]
root_path = "storage"

[routes.videos]
backend = "local_disk"

[routes.videos.local]
root_path = "storage"

[routes.previews]
backend = "local_disk"

[routes.previews.local]
root_path = "storage"

[routes.markers]
backend = "local_disk"

[routes.markers.local]
root_path = "storage"

# ===============================================================================
# COMPANY OVERRIDES
# ===============================================================================
#[[companies]]
#id = 1
#slug = "acme"
#categories = ["diplomas"]
#
#[companies.routes.portraits]
#backend = "cloud_disk"
#
#[companies.routes.portraits.cloud_disk]
#enabled = true
#oauth_token = "..."
#base_path = "ar-portal"
"#;
