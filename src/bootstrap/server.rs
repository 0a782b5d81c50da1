use arstore_events::{AppEvent, EventBus};
use arstore_manager::StorageManager;
use std::sync::Arc;

/// Creates every configured company's root and category folders.
/// An unreachable backend must not keep the service from starting.
pub async fn initialize_folders(manager: &StorageManager, events: &Arc<EventBus>) {
    let companies = manager.config().current().companies.len();
    if companies == 0 {
        return;
    }

    let failures = manager.provision_all_companies().await;
    if !failures.is_empty() {
        events.emit(AppEvent::Error {
            context: "Startup provisioning".to_string(),
            error: format!(
                "{} of {} company(ies) not provisioned, continuing",
                failures.len(),
                companies
            ),
        });
    }
}
