//! In-memory backend and factory for manager tests

use crate::factory::AdapterFactory;
use arstore_config::{BackendKind, ResolvedRoute};
use arstore_models::ProvisionedPath;
use arstore_storage::{StorageBackend, StorageError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Token that makes every call of a mock cloud adapter fail with `AuthError`
pub const INVALID_TOKEN: &str = "invalid-token";

pub struct MockBackend {
    kind: BackendKind,
    reject_auth: bool,
    latency: Duration,
    dirs: Mutex<HashSet<String>>,
    files: Mutex<HashMap<String, Bytes>>,
    pub directory_exists_calls: AtomicUsize,
    pub create_directory_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(kind: BackendKind, reject_auth: bool, latency: Duration) -> Self {
        Self {
            kind,
            reject_auth,
            latency,
            dirs: Mutex::new(HashSet::new()),
            files: Mutex::new(HashMap::new()),
            directory_exists_calls: AtomicUsize::new(0),
            create_directory_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
        }
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().contains(path)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.lock().contains_key(path)
    }

    pub fn creates(&self) -> usize {
        self.create_directory_calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.directory_exists_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.reject_auth {
            return Err(StorageError::AuthError {
                path: path.to_string(),
                reason: "HTTP 401: Unauthorized".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn save(&self, path: &ProvisionedPath, data: Bytes) -> Result<ProvisionedPath, StorageError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(path).await?;
        self.files.lock().insert(path.to_string(), data);
        Ok(path.clone())
    }

    async fn read(&self, path: &ProvisionedPath) -> Result<Bytes, StorageError> {
        self.enter(path).await?;
        self.files
            .lock()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        self.enter(path).await?;
        self.files
            .lock()
            .remove(path.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        self.enter(path).await?;
        Ok(self.has_file(path.as_str()))
    }

    fn public_url(&self, _path: &ProvisionedPath) -> Option<String> {
        None
    }

    async fn directory_exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        self.directory_exists_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(path).await?;
        Ok(self.has_dir(path.as_str()))
    }

    async fn create_directory(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        self.create_directory_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(path).await?;
        if self.has_file(path.as_str()) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        let mut dirs = self.dirs.lock();
        if let Some(parent) = path.parent() {
            if !dirs.contains(parent.as_str()) {
                return Err(StorageError::NotFound(parent.to_string()));
            }
        }
        if !dirs.insert(path.to_string()) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Ok(())
    }
}

/// Hands out one shared [`MockBackend`] per adapter id, so adapters with
/// identical settings see the same simulated storage.
pub struct MockFactory {
    latency: Duration,
    create_delay: Duration,
    backends: Mutex<HashMap<String, Arc<MockBackend>>>,
    pub created: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            create_delay: Duration::ZERO,
            backends: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Slows adapter construction down, leaving backend calls as they are
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn backend_for(&self, adapter_id: &str) -> Option<Arc<MockBackend>> {
        self.backends.lock().get(adapter_id).cloned()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AdapterFactory for MockFactory {
    async fn create(&self, route: &ResolvedRoute) -> Result<Arc<dyn StorageBackend>, StorageError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        let kind = route.backend();
        let reject_auth = kind == BackendKind::CloudDisk && route.route.cloud_disk.oauth_token == INVALID_TOKEN;
        let backend = Arc::clone(
            self.backends
                .lock()
                .entry(route.route.adapter_id())
                .or_insert_with(|| Arc::new(MockBackend::new(kind, reject_auth, self.latency))),
        );
        Ok(backend)
    }
}
