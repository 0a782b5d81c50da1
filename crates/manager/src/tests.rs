use crate::mock::{MockFactory, INVALID_TOKEN};
use crate::{ManagerError, StorageManager};
use arstore_config::{
    default_document, BackendKind, ConfigDiff, ConfigStore, CompanyProfile, MemoryPersistence,
    RouteConfig, RoutingDocument,
};
use arstore_events::EventBus;
use arstore_models::{CompanyId, ProvisionedPath, RoutingKey};
use arstore_storage::StorageErrorKind;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const ACME: CompanyId = CompanyId(1);
const GLOBEX: CompanyId = CompanyId(2);

fn company(id: CompanyId, slug: &str) -> CompanyProfile {
    CompanyProfile {
        id,
        slug: slug.to_string(),
        categories: vec!["diplomas".to_string()],
        routes: BTreeMap::new(),
    }
}

fn cloud_route(token: &str) -> RouteConfig {
    let mut route = RouteConfig::local_disk("storage");
    route.backend = BackendKind::CloudDisk;
    route.cloud_disk.enabled = true;
    route.cloud_disk.oauth_token = token.to_string();
    route
}

fn document() -> RoutingDocument {
    let mut doc = default_document();
    doc.companies.push(company(ACME, "acme"));
    doc.companies.push(company(GLOBEX, "globex"));
    doc
}

fn with_cloud_portraits(mut doc: RoutingDocument, token: &str) -> RoutingDocument {
    doc.companies[0]
        .routes
        .insert(RoutingKey::portraits(), cloud_route(token));
    doc
}

fn manager(doc: RoutingDocument, factory: &Arc<MockFactory>) -> StorageManager {
    let store = ConfigStore::from_document(doc, Arc::new(MemoryPersistence::new()));
    StorageManager::with_factory(Arc::new(store), factory.clone(), EventBus::new(true))
}

fn path(raw: &str) -> ProvisionedPath {
    ProvisionedPath::parse(raw).unwrap()
}

#[tokio::test]
async fn test_provisioning_is_idempotent() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);

    let first = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "123", &[])
        .await
        .unwrap();
    assert_eq!(first.as_str(), "acme/diplomas/123/Image");

    let handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    // acme, diplomas, 123 + four local subfolders
    assert_eq!(backend.creates(), 7);
    for sub in ["Image", "QR", "nft_markers", "nft_cache"] {
        assert!(backend.has_dir(&format!("acme/diplomas/123/{}", sub)));
    }

    let probes = backend.probes();
    let second = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "123", &[])
        .await
        .unwrap();
    assert_eq!(second, first);
    assert_eq!(backend.creates(), 7);
    assert_eq!(backend.probes(), probes);
}

#[tokio::test]
async fn test_explicit_subfolders_and_empty_list() {
    let factory = Arc::new(MockFactory::new());
    let mut doc = document();
    doc.provisioning.subfolders.local_disk.clear();
    let manager = manager(doc, &factory);

    let custom = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "7", &["Video".to_string()])
        .await
        .unwrap();
    assert_eq!(custom.as_str(), "acme/diplomas/7/Video");

    // No subfolders at all: the order folder itself is returned
    let bare = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "8", &[])
        .await
        .unwrap();
    assert_eq!(bare.as_str(), "acme/diplomas/8");

    let bad = manager
        .provision_hierarchy(ACME, "acme", "../etc", "8", &[])
        .await
        .unwrap_err();
    assert_eq!(bad.kind(), StorageErrorKind::ConfigInvalid);
}

#[tokio::test]
async fn test_routing_follows_overrides_and_defaults() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(with_cloud_portraits(document(), "token"), &factory);
    let portraits = RoutingKey::portraits();

    let acme = manager.get_adapter(ACME, &portraits).await.unwrap();
    let globex = manager.get_adapter(GLOBEX, &portraits).await.unwrap();
    let acme_videos = manager.get_adapter(ACME, &RoutingKey::new("videos")).await.unwrap();
    let unknown_company = manager.get_adapter(CompanyId(99), &portraits).await.unwrap();

    assert_eq!(acme.kind(), BackendKind::CloudDisk);
    assert_eq!(globex.kind(), BackendKind::LocalDisk);
    assert_eq!(acme_videos.kind(), BackendKind::LocalDisk);
    assert_eq!(unknown_company.kind(), BackendKind::LocalDisk);

    let err = manager
        .get_adapter(ACME, &RoutingKey::new("holograms"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::UnknownRoutingKey(ref key) if key == "holograms"));
}

#[tokio::test]
async fn test_disabled_remote_backend_is_rejected() {
    let factory = Arc::new(MockFactory::new());
    let mut doc = with_cloud_portraits(document(), "token");
    doc.remote.cloud_disk_enabled = false;
    let manager = manager(doc, &factory);

    let err = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap_err();
    assert!(matches!(err, ManagerError::BackendDisabled(BackendKind::CloudDisk)));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_adapter_is_reused_until_settings_change() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(with_cloud_portraits(document(), "token"), &factory);
    let portraits = RoutingKey::portraits();

    let first = manager.get_adapter(ACME, &portraits).await.unwrap();
    let again = manager.get_adapter(ACME, &portraits).await.unwrap();
    assert!(first.ptr_eq(&again));
    assert_eq!(factory.created(), 1);

    // New token without an explicit invalidate: the fingerprint no longer matches
    manager
        .config()
        .set_company_override(ACME, portraits.clone(), cloud_route("rotated"))
        .await
        .unwrap();
    let rotated = manager.get_adapter(ACME, &portraits).await.unwrap();
    assert!(!rotated.ptr_eq(&first));
    assert_ne!(rotated.adapter_id(), first.adapter_id());
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_cached_handle() {
    let factory = Arc::new(MockFactory::with_latency(Duration::from_millis(5)));
    let manager = Arc::new(manager(document(), &factory));

    let lookups = (0..16).map(|_| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.get_adapter(ACME, &RoutingKey::portraits()).await })
    });
    let handles: Vec<_> = futures::future::join_all(lookups)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let cached = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    assert!(handles.iter().all(|h| h.adapter_id() == cached.adapter_id()));
    assert_eq!(manager.cached_adapters(), 1);
}

#[tokio::test]
async fn test_directory_cache_expires_after_ttl() {
    let factory = Arc::new(MockFactory::new());
    let mut doc = document();
    doc.directory_cache.local_disk_ttl_secs = 1;
    let manager = manager(doc, &factory);

    manager
        .provision_hierarchy(ACME, "acme", "diplomas", "1", &["Image".to_string()])
        .await
        .unwrap();
    let handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    let probes = backend.probes();

    // Within the TTL nothing reaches the backend
    manager
        .provision_hierarchy(ACME, "acme", "diplomas", "1", &["Image".to_string()])
        .await
        .unwrap();
    assert_eq!(backend.probes(), probes);

    tokio::time::sleep(Duration::from_millis(1_300)).await;

    manager
        .provision_hierarchy(ACME, "acme", "diplomas", "1", &["Image".to_string()])
        .await
        .unwrap();
    // Every level re-checked once, nothing re-created
    assert_eq!(backend.probes(), probes + 4);
    assert_eq!(backend.creates(), 4);
}

#[tokio::test]
async fn test_directory_exists_uses_cache_within_ttl() {
    let factory = Arc::new(MockFactory::new());
    let mut doc = document();
    doc.directory_cache.local_disk_ttl_secs = 1;
    let manager = manager(doc, &factory);
    let key = RoutingKey::portraits();
    let diplomas = path("acme/diplomas");

    manager
        .provision_hierarchy(ACME, "acme", "diplomas", "1", &["Image".to_string()])
        .await
        .unwrap();
    let handle = manager.get_adapter(ACME, &key).await.unwrap();
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    let probes = backend.probes();

    assert!(manager.directory_exists(ACME, &key, &diplomas).await.unwrap());
    assert!(manager.directory_exists(ACME, &key, &diplomas).await.unwrap());
    assert_eq!(backend.probes(), probes);

    tokio::time::sleep(Duration::from_millis(1_300)).await;

    // One probe refreshes the entry, the next check is served from the cache
    assert!(manager.directory_exists(ACME, &key, &diplomas).await.unwrap());
    assert!(manager.directory_exists(ACME, &key, &diplomas).await.unwrap());
    assert_eq!(backend.probes(), probes + 1);

    // Missing folders are never cached
    let ghost = path("acme/ghost");
    assert!(!manager.directory_exists(ACME, &key, &ghost).await.unwrap());
    assert!(!manager.directory_exists(ACME, &key, &ghost).await.unwrap());
    assert_eq!(backend.probes(), probes + 3);
}

#[tokio::test]
async fn test_file_blocking_a_folder_is_not_cached() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);
    let key = RoutingKey::portraits();

    manager
        .provision_hierarchy(ACME, "acme", "diplomas", "1", &["Image".to_string()])
        .await
        .unwrap();
    let blocker = path("acme/diplomas/123");
    manager
        .save_file(ACME, &key, &blocker, Bytes::from_static(b"x"))
        .await
        .unwrap();

    let err = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "123", &["Image".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::AlreadyExists);
    match &err {
        ManagerError::Backend { path, .. } => assert_eq!(path, "acme/diplomas/123"),
        other => panic!("unexpected error: {other}"),
    }

    let handle = manager.get_adapter(ACME, &key).await.unwrap();
    assert!(!manager.directories().is_known(handle.kind(), handle.adapter_id(), &blocker).await);
}

#[tokio::test]
async fn test_invalidation_is_isolated_per_company() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);
    let portraits = RoutingKey::portraits();

    manager.provision_hierarchy(ACME, "acme", "diplomas", "1", &[]).await.unwrap();
    manager.provision_hierarchy(GLOBEX, "globex", "diplomas", "1", &[]).await.unwrap();
    let acme = manager.get_adapter(ACME, &portraits).await.unwrap();
    let globex = manager.get_adapter(GLOBEX, &portraits).await.unwrap();
    assert_eq!(manager.cached_adapters(), 2);

    let report = manager.invalidate(ACME, None).unwrap();
    assert_eq!(report.adapters, 1);
    assert_eq!(report.slugs, 1);
    assert_eq!(manager.cached_adapters(), 1);

    let dirs = manager.directories();
    assert!(!dirs.is_known(acme.kind(), acme.adapter_id(), &path("acme/diplomas")).await);
    assert!(dirs.is_known(globex.kind(), globex.adapter_id(), &path("globex/diplomas")).await);

    let globex_again = manager.get_adapter(GLOBEX, &portraits).await.unwrap();
    assert!(globex_again.ptr_eq(&globex));
}

#[tokio::test]
async fn test_invalidating_one_company_keeps_another_construction_cached() {
    let factory = Arc::new(MockFactory::new().with_create_delay(Duration::from_millis(100)));
    let manager = Arc::new(manager(document(), &factory));
    let portraits = RoutingKey::portraits();

    let building = {
        let manager = Arc::clone(&manager);
        let portraits = portraits.clone();
        tokio::spawn(async move { manager.get_adapter(GLOBEX, &portraits).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.invalidate(ACME, None).unwrap();

    let globex = building.await.unwrap().unwrap();
    assert_eq!(manager.cached_adapters(), 1);
    let again = manager.get_adapter(GLOBEX, &portraits).await.unwrap();
    assert!(again.ptr_eq(&globex));
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn test_construction_racing_its_own_invalidation_is_not_cached() {
    let factory = Arc::new(MockFactory::new().with_create_delay(Duration::from_millis(100)));
    let manager = Arc::new(manager(document(), &factory));

    let building = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.get_adapter(ACME, &RoutingKey::portraits()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.invalidate(ACME, None).unwrap();

    building.await.unwrap().unwrap();
    assert_eq!(manager.cached_adapters(), 0);
}

#[tokio::test]
async fn test_invalidate_single_routing_key() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);

    manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    manager.get_adapter(ACME, &RoutingKey::new("videos")).await.unwrap();

    let report = manager.invalidate(ACME, Some(&RoutingKey::new("videos"))).unwrap();
    assert_eq!(report.adapters, 1);
    assert_eq!(manager.cached_adapters(), 1);
}

#[tokio::test]
async fn test_config_diff_drives_invalidation() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);
    manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    manager.get_adapter(GLOBEX, &RoutingKey::portraits()).await.unwrap();

    let diff = ConfigDiff {
        changed_companies: vec![GLOBEX],
        ..ConfigDiff::default()
    };
    manager.apply_config_diff(&diff).unwrap();
    assert_eq!(manager.cached_adapters(), 1);

    let diff = ConfigDiff {
        changed_routes: vec![RoutingKey::portraits()],
        ..ConfigDiff::default()
    };
    manager.apply_config_diff(&diff).unwrap();
    assert_eq!(manager.cached_adapters(), 0);
}

#[tokio::test]
async fn test_same_path_on_every_backend() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(with_cloud_portraits(document(), "token"), &factory);
    let leaf = ["Image".to_string()];

    let cloud = manager.provision_hierarchy(ACME, "acme", "diplomas", "5", &leaf).await.unwrap();
    let local = manager
        .provision_hierarchy_on(ACME, &RoutingKey::new("videos"), "acme", "diplomas", "5", &leaf)
        .await
        .unwrap();
    assert_eq!(cloud, local);

    let cloud_handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    let local_handle = manager.get_adapter(ACME, &RoutingKey::new("videos")).await.unwrap();
    for handle in [cloud_handle, local_handle] {
        let backend = factory.backend_for(handle.adapter_id()).unwrap();
        assert!(backend.has_dir("acme/diplomas/5/Image"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_provisioning_creates_each_folder_once() {
    let factory = Arc::new(MockFactory::with_latency(Duration::from_millis(10)));
    let manager = Arc::new(manager(with_cloud_portraits(document(), "token"), &factory));

    let tasks = (0..10).map(|_| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager
                .provision_hierarchy(ACME, "acme", "badges", "42", &["Image".to_string()])
                .await
        })
    });
    for result in futures::future::join_all(tasks).await {
        assert_eq!(result.unwrap().unwrap().as_str(), "acme/badges/42/Image");
    }

    let handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    assert_eq!(backend.creates(), 4);
}

#[tokio::test]
async fn test_invalid_token_fails_without_fallback() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(with_cloud_portraits(document(), INVALID_TOKEN), &factory);

    let err = manager
        .provision_hierarchy(ACME, "acme", "diplomas", "123", &[])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), StorageErrorKind::Auth);
    match &err {
        ManagerError::Backend { backend, path, .. } => {
            assert_eq!(*backend, BackendKind::CloudDisk);
            assert_eq!(path, "acme");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("cloud_disk"));

    let file = path("acme/diplomas/123/Image/front.png");
    let err = manager
        .save_file(ACME, &RoutingKey::portraits(), &file, Bytes::from_static(b"img"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::Auth);
    assert!(matches!(
        err,
        ManagerError::Backend { backend: BackendKind::CloudDisk, .. }
    ));

    // Only the cloud adapter was ever built, so nothing was written anywhere else
    assert_eq!(factory.created(), 1);
    let handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    assert_eq!(handle.kind(), BackendKind::CloudDisk);
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    assert!(!backend.has_file(file.as_str()));
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn test_file_operations_pass_through() {
    let factory = Arc::new(MockFactory::new());
    let manager = manager(document(), &factory);
    let key = RoutingKey::portraits();
    let file = path("acme/diplomas/1/Image/front.png");

    let stored = manager
        .save_file(ACME, &key, &file, Bytes::from_static(b"img"))
        .await
        .unwrap();
    assert_eq!(stored, file);
    assert!(manager.file_exists(ACME, &key, &file).await.unwrap());
    assert_eq!(manager.get_file(ACME, &key, &file).await.unwrap(), Bytes::from_static(b"img"));
    assert_eq!(manager.public_url(ACME, &key, &file).await.unwrap(), None);

    assert!(manager.delete_file_if_exists(ACME, &key, &file).await.unwrap());
    assert!(!manager.delete_file_if_exists(ACME, &key, &file).await.unwrap());

    let err = manager.delete_file(ACME, &key, &file).await.unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::NotFound);
    assert!(err.storage_error().is_some());
}

#[tokio::test]
async fn test_provision_company_creates_categories() {
    let factory = Arc::new(MockFactory::new());
    let mut doc = document();
    doc.companies[0].categories.push("badges".to_string());
    let manager = manager(doc, &factory);

    assert_eq!(manager.provision_company(ACME).await.unwrap(), 2);
    assert!(manager.provision_all_companies().await.is_empty());

    let handle = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap();
    let backend = factory.backend_for(handle.adapter_id()).unwrap();
    assert!(backend.has_dir("acme/diplomas"));
    assert!(backend.has_dir("acme/badges"));
    assert!(backend.has_dir("globex/diplomas"));

    let err = manager.provision_company(CompanyId(77)).await.unwrap_err();
    assert!(matches!(err, ManagerError::CompanyNotFound(CompanyId(77))));
}

#[tokio::test]
async fn test_construction_error_is_typed() {
    let mut doc = document();
    doc.companies[0]
        .routes
        .insert(RoutingKey::portraits(), cloud_route(""));
    let store = ConfigStore::from_document(doc, Arc::new(MemoryPersistence::new()));
    let manager = StorageManager::new(Arc::new(store), EventBus::new(true));

    let err = manager.get_adapter(ACME, &RoutingKey::portraits()).await.unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Connect { backend: BackendKind::CloudDisk, .. }
    ));
    assert_eq!(err.kind(), StorageErrorKind::ConfigInvalid);
}
