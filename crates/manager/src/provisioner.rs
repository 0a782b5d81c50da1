use super::errors::ManagerError;
use super::models::{AdapterHandle, HierarchicalProvisioner};
use arstore_cache::{DirectoryCache, ProvisionLocks};
use arstore_models::ProvisionedPath;
use arstore_storage::{StorageError, StorageErrorKind};
use std::collections::HashSet;
use std::sync::Arc;

type Result<T> = std::result::Result<T, ManagerError>;

impl HierarchicalProvisioner {
    pub fn new(directories: Arc<DirectoryCache>) -> Self {
        Self {
            directories,
            locks: ProvisionLocks::new(),
        }
    }

    /// Makes sure every folder leading to each of `leaves` exists on the
    /// handle's backend. Returns how many folders were actually created.
    ///
    /// Creation for one company on one adapter is serialised, so concurrent
    /// callers asking for the same new folder issue a single create.
    pub async fn ensure(
        &self,
        handle: &AdapterHandle,
        company_slug: &str,
        leaves: &[ProvisionedPath],
    ) -> Result<usize> {
        let chain = ordered_chain(leaves);

        if self.all_known(handle, &chain).await {
            return Ok(0);
        }

        let _guard = self.locks.acquire(handle.adapter_id(), company_slug).await;

        let backend = handle.backend();
        let mut created = 0;
        for dir in &chain {
            if self
                .directories
                .is_known(handle.kind(), handle.adapter_id(), dir)
                .await
            {
                continue;
            }

            let exists = backend
                .directory_exists(dir)
                .await
                .map_err(|e| backend_error(handle, dir, e))?;

            if !exists {
                match backend.create_directory(dir).await {
                    Ok(()) => {
                        created += 1;
                        tracing::debug!(backend = %handle.kind(), path = %dir, "created folder");
                    }
                    // Either another writer won the race or a file is in the way
                    Err(e) if e.kind() == StorageErrorKind::AlreadyExists => {
                        let is_dir = backend
                            .directory_exists(dir)
                            .await
                            .map_err(|e| backend_error(handle, dir, e))?;
                        if !is_dir {
                            return Err(backend_error(handle, dir, e));
                        }
                    }
                    Err(e) => return Err(backend_error(handle, dir, e)),
                }
            }

            self.directories
                .record_exists(handle.kind(), handle.adapter_id(), dir)
                .await;
        }

        Ok(created)
    }

    async fn all_known(&self, handle: &AdapterHandle, chain: &[ProvisionedPath]) -> bool {
        for dir in chain {
            if !self
                .directories
                .is_known(handle.kind(), handle.adapter_id(), dir)
                .await
            {
                return false;
            }
        }
        true
    }
}

/// Every prefix of every leaf, parents before children, without repeats
fn ordered_chain(leaves: &[ProvisionedPath]) -> Vec<ProvisionedPath> {
    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    for leaf in leaves {
        for dir in leaf.chain() {
            if seen.insert(dir.clone()) {
                chain.push(dir);
            }
        }
    }
    chain
}

fn backend_error(handle: &AdapterHandle, path: &ProvisionedPath, source: StorageError) -> ManagerError {
    tracing::warn!(
        company = %handle.company_id(),
        routing_key = %handle.routing_key(),
        backend = %handle.kind(),
        path = %path,
        error = %source,
        "provisioning aborted"
    );
    ManagerError::Backend {
        backend: handle.kind(),
        path: path.to_string(),
        source,
    }
}
