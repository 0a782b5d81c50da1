use super::defaults::{self, CURRENT_VERSION};
use super::errors::ConfigError;
use arstore_events::{AppEvent, EventBus};
use arstore_models::RoutingKey;
use std::path::Path;
use std::sync::Arc;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

type Result<T> = std::result::Result<T, ConfigError>;

/// Backend names accepted by earlier document versions
const BACKEND_ALIASES: &[(&str, &str)] = &[
    ("local", "local_disk"),
    ("s3", "object_storage"),
    ("minio", "object_storage"),
    ("yandex", "cloud_disk"),
    ("yandex_disk", "cloud_disk"),
];

/// Migrates the config file to the latest format if needed
pub async fn migrate_config_if_needed<P: AsRef<Path>>(
    path: P,
    events: Option<&Arc<EventBus>>,
) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let (migrated, added_fields) = migrate_document(&content)?;

    // Only write if something changed
    if !added_fields.is_empty() {
        arstore_filesystem::FileSystem::write_synced(path.as_ref(), migrated.as_bytes()).await?;

        if let Some(event_bus) = events {
            event_bus.emit(AppEvent::ConfigMigrated {
                added_fields: added_fields.clone(),
            });
        }
    }

    Ok(added_fields)
}

/// Brings a document up to date, preserving comments and layout
pub fn migrate_document(content: &str) -> Result<(String, Vec<String>)> {
    let mut doc = content.parse::<DocumentMut>()?;
    let mut added_fields = Vec::new();

    migrate_version(&mut doc, &mut added_fields);
    migrate_timeouts(&mut doc, &mut added_fields)?;
    migrate_directory_cache(&mut doc, &mut added_fields)?;
    migrate_remote(&mut doc, &mut added_fields)?;
    migrate_provisioning(&mut doc, &mut added_fields)?;
    migrate_routes(&mut doc, &mut added_fields)?;
    migrate_companies(&mut doc, &mut added_fields);

    // Single-backend [storage] section predates per-key routing
    if doc.contains_key("storage") {
        doc.remove("storage");
        added_fields.push("removed deprecated [storage] section".to_string());
    }

    Ok((doc.to_string(), added_fields))
}

fn migrate_version(doc: &mut DocumentMut, added_fields: &mut Vec<String>) {
    let version = doc.get("version").and_then(|v| v.as_integer());
    if version.map_or(true, |v| v < i64::from(CURRENT_VERSION)) {
        doc["version"] = Item::Value(Value::from(i64::from(CURRENT_VERSION)));
        added_fields.push(format!("version = {}", CURRENT_VERSION));
    }
}

fn migrate_timeouts(doc: &mut DocumentMut, added_fields: &mut Vec<String>) -> Result<()> {
    let timeouts = ensure_table(doc.as_table_mut(), "timeouts", "timeouts", added_fields)?;
    ensure_field(timeouts, "local_disk_secs", Value::from(defaults::local_disk_timeout_secs() as i64), added_fields);
    ensure_field(timeouts, "object_storage_secs", Value::from(defaults::object_storage_timeout_secs() as i64), added_fields);
    ensure_field(timeouts, "cloud_disk_secs", Value::from(defaults::cloud_disk_timeout_secs() as i64), added_fields);
    Ok(())
}

fn migrate_directory_cache(doc: &mut DocumentMut, added_fields: &mut Vec<String>) -> Result<()> {
    let cache = ensure_table(doc.as_table_mut(), "directory_cache", "directory_cache", added_fields)?;
    ensure_field(cache, "local_disk_ttl_secs", Value::from(defaults::local_disk_ttl_secs() as i64), added_fields);
    ensure_field(cache, "object_storage_ttl_secs", Value::from(defaults::object_storage_ttl_secs() as i64), added_fields);
    ensure_field(cache, "cloud_disk_ttl_secs", Value::from(defaults::cloud_disk_ttl_secs() as i64), added_fields);
    ensure_field(cache, "max_entries", Value::from(defaults::directory_cache_max_entries() as i64), added_fields);
    Ok(())
}

fn migrate_remote(doc: &mut DocumentMut, added_fields: &mut Vec<String>) -> Result<()> {
    let remote = ensure_table(doc.as_table_mut(), "remote", "remote", added_fields)?;
    ensure_field(remote, "object_storage_enabled", Value::from(true), added_fields);
    ensure_field(remote, "cloud_disk_enabled", Value::from(true), added_fields);
    Ok(())
}

fn migrate_provisioning(doc: &mut DocumentMut, added_fields: &mut Vec<String>) -> Result<()> {
    let provisioning = ensure_table(doc.as_table_mut(), "provisioning", "provisioning", added_fields)?;
    ensure_field(provisioning, "routing_key", Value::from(RoutingKey::PORTRAITS), added_fields);

    let subfolders = ensure_table(provisioning, "subfolders", "provisioning.subfolders", added_fields)?;
    ensure_field(subfolders, "local_disk", string_array(defaults::local_disk_subfolders()), added_fields);
    ensure_field(subfolders, "object_storage", string_array(defaults::object_storage_subfolders()), added_fields);
    ensure_field(subfolders, "cloud_disk", string_array(defaults::cloud_disk_subfolders()), added_fields);
    Ok(())
}

fn migrate_routes(doc: &mut DocumentMut, added_fields: &mut Vec<String>) -> Result<()> {
    let routes = ensure_table(doc.as_table_mut(), "routes", "routes", added_fields)?;

    // Every built-in content type must resolve to some backend
    for key in RoutingKey::BUILTIN {
        if !routes.contains_key(key) {
            let mut local = Table::new();
            local["root_path"] = toml_edit::value(defaults::local_root_path());

            let mut route = Table::new();
            route["backend"] = toml_edit::value("local_disk");
            route["local"] = Item::Table(local);

            routes[key] = Item::Table(route);
            added_fields.push(format!("routes.{}", key));
        }
    }

    for (key, item) in routes.iter_mut() {
        if let Some(route) = item.as_table_mut() {
            migrate_backend_alias(route, &format!("routes.{}", key.get()), added_fields);
        }
    }

    Ok(())
}

fn migrate_companies(doc: &mut DocumentMut, added_fields: &mut Vec<String>) {
    // Only migrate an existing array - never create an empty one
    if let Some(companies) = doc
        .get_mut("companies")
        .and_then(|c| c.as_array_of_tables_mut())
    {
        for (idx, company) in companies.iter_mut().enumerate() {
            if !company.contains_key("categories") {
                company.insert("categories", Item::Value(Value::Array(Array::new())));
                added_fields.push(format!("companies[{}].categories", idx));
            }

            if let Some(routes) = company.get_mut("routes").and_then(|r| r.as_table_mut()) {
                for (key, item) in routes.iter_mut() {
                    if let Some(route) = item.as_table_mut() {
                        let context = format!("companies[{}].routes.{}", idx, key.get());
                        migrate_backend_alias(route, &context, added_fields);
                    }
                }
            }
        }
    }
}

fn migrate_backend_alias(route: &mut Table, context: &str, added_fields: &mut Vec<String>) {
    let current = route.get("backend").and_then(|b| b.as_str()).map(str::to_string);
    match current {
        Some(name) => {
            if let Some((_, canonical)) = BACKEND_ALIASES.iter().find(|(alias, _)| *alias == name) {
                route["backend"] = toml_edit::value(*canonical);
                added_fields.push(format!("{}.backend ({} -> {})", context, name, canonical));
            }
        }
        None => {
            route["backend"] = toml_edit::value("local_disk");
            added_fields.push(format!("{}.backend", context));
        }
    }
}

fn ensure_table<'a>(
    parent: &'a mut Table,
    key: &str,
    label: &str,
    added_fields: &mut Vec<String>,
) -> Result<&'a mut Table> {
    if !parent.contains_key(key) {
        let mut table = Table::new();
        table.set_implicit(true);
        parent[key] = Item::Table(table);
        added_fields.push(label.to_string());
    }

    parent[key]
        .as_table_mut()
        .ok_or_else(|| ConfigError::MigrationError(format!("Invalid [{}] section in config", label)))
}

fn ensure_field(
    table: &mut Table,
    key: &str,
    default_value: Value,
    added_fields: &mut Vec<String>,
) {
    if !table.contains_key(key) {
        table[key] = Item::Value(default_value);
        added_fields.push(key.to_string());
    }
}

fn string_array(values: Vec<String>) -> Value {
    let mut arr = Array::new();
    for value in values {
        arr.push(value);
    }
    Value::Array(arr)
}
