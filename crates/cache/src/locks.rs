use super::models::{ProvisionGuard, ProvisionLocks};
use std::sync::Arc;
use tokio::sync::Mutex;

impl ProvisionLocks {
    pub fn new() -> Self {
        Self {
            locks: dashmap::DashMap::new(),
        }
    }

    /// Waits for exclusive access to the hierarchy of `company_slug` on one adapter
    pub async fn acquire(&self, adapter_id: &str, company_slug: &str) -> ProvisionGuard<'_> {
        let key = (Arc::<str>::from(adapter_id), Arc::<str>::from(company_slug));
        let mutex = {
            let entry = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        let guard = mutex.lock_owned().await;
        ProvisionGuard {
            owner: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of (adapter, company) pairs with a live lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for ProvisionLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProvisionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the mutex: nobody holds or awaits it
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
