use super::models::{AppEvent, EventBus};
use colored::Colorize;
use std::sync::Arc;

impl EventBus {
    pub fn new(silent_mode: bool) -> Arc<Self> {
        Arc::new(Self { silent_mode })
    }

    pub fn emit(&self, event: AppEvent) {
        match event {
            // Application lifecycle
            AppEvent::Starting => {
                self.print(format!("\n{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black()));
                self.print(format!("  {}", "arstore - Storage Routing Service".white().bold()));
                self.print(format!("  {} {}", "Version".dimmed(), env!("CARGO_PKG_VERSION").cyan()));
                self.print(format!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black()));
            }
            AppEvent::Ready { config_path } => {
                self.print(format!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".green()));
                self.print(format!("  {} {}", "Watching".white(), config_path.cyan()));
                self.print(format!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".green()));
            }
            AppEvent::Shutdown => {
                self.print(format!("\n{}", "Service shutting down".red()));
            }

            // Configuration
            AppEvent::ConfigLoading { path } => {
                self.print(format!("  {} {}", "Loading config".dimmed(), path.cyan()));
            }
            AppEvent::ConfigLoaded { routes_count, companies_count } => {
                if companies_count == 0 {
                    self.print(format!(
                        "  {} {} route(s), no company overrides",
                        "✓".green(),
                        routes_count.to_string().cyan()
                    ));
                } else {
                    self.print(format!(
                        "  {} {} route(s), {} company profile(s)",
                        "✓".green(),
                        routes_count.to_string().cyan(),
                        companies_count.to_string().cyan()
                    ));
                }
            }
            AppEvent::ConfigCreated { path } => {
                tracing::warn!("Routing configuration not found");
                tracing::info!("Created default routing configuration at: {}", path);
            }
            AppEvent::ConfigMigrated { added_fields } => {
                if !added_fields.is_empty() {
                    self.print(format!(
                        "  {} Config updated: added {}",
                        "↻".blue(),
                        added_fields.join(", ").dimmed()
                    ));
                }
            }
            AppEvent::ConfigCorrupt { error } => {
                tracing::error!("Routing configuration is corrupt, using local-disk defaults: {}", error);
                self.print(format!(
                    "  {} Config corrupt, running on defaults until re-saved",
                    "⚠".yellow()
                ));
            }
            AppEvent::ConfigReloaded { changed_routes, changed_companies } => {
                tracing::info!(
                    "Configuration reloaded ({} default route(s), {} company profile(s) changed)",
                    changed_routes.len(),
                    changed_companies
                );
            }
            AppEvent::ConfigError { error } => {
                tracing::error!("Configuration error: {}", error);
            }

            // Adapters
            AppEvent::AdapterCreated { company, routing_key, backend } => {
                tracing::debug!("Adapter created for company {} ({} -> {})", company, routing_key, backend);
            }
            AppEvent::AdapterInvalidated { company, adapters, directories } => {
                self.print(format!(
                    "  {} Invalidated company {} ({} adapter(s), {} folder tree(s))",
                    "↻".blue(),
                    company.cyan(),
                    adapters,
                    directories
                ));
            }
            AppEvent::AllAdaptersInvalidated { adapters } => {
                self.print(format!("  {} Dropped {} cached adapter(s)", "↻".blue(), adapters));
            }

            // Provisioning
            AppEvent::CompanyProvisioned { slug, categories } => {
                self.print(format!(
                    "  {} Provisioned {} ({} categor{})",
                    "✓".green(),
                    slug.cyan(),
                    categories,
                    if categories == 1 { "y" } else { "ies" }
                ));
            }
            AppEvent::AllCompaniesProvisioned => {
                // Silent
            }

            // Errors
            AppEvent::Error { context, error } => {
                tracing::error!("{}: {}", context, error);
            }
        }
    }

    fn print(&self, line: String) {
        if !self.silent_mode {
            println!("{}", line);
        }
    }
}
