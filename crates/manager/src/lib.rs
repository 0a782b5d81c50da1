mod adapters;
mod errors;
mod factory;
mod models;
mod operations;
mod provisioner;
mod provisioning;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use errors::ManagerError;
pub use factory::{AdapterFactory, DefaultAdapterFactory};
pub use models::{AdapterHandle, HierarchicalProvisioner, InvalidationReport, StorageManager};
