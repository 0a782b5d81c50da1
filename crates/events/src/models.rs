use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    // Application lifecycle
    Starting,
    Ready { config_path: String },
    Shutdown,

    // Configuration
    ConfigLoading { path: String },
    ConfigLoaded { routes_count: usize, companies_count: usize },
    ConfigCreated { path: String },
    ConfigMigrated { added_fields: Vec<String> },
    ConfigCorrupt { error: String },
    ConfigReloaded { changed_routes: Vec<String>, changed_companies: usize },
    ConfigError { error: String },

    // Adapters
    AdapterCreated { company: String, routing_key: String, backend: String },
    AdapterInvalidated { company: String, adapters: usize, directories: usize },
    AllAdaptersInvalidated { adapters: usize },

    // Provisioning
    CompanyProvisioned { slug: String, categories: usize },
    AllCompaniesProvisioned,

    // Errors
    Error { context: String, error: String },
}

pub struct EventBus {
    pub(super) silent_mode: bool,
}
