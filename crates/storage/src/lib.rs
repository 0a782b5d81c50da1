mod backend;
mod cloud_disk;
mod errors;
mod factory;
mod local;

#[cfg(feature = "s3")]
pub mod keys;
#[cfg(feature = "s3")]
mod s3;

pub use backend::StorageBackend;
pub use cloud_disk::CloudDiskBackend;
pub use errors::*;
pub use factory::connect;
pub use local::LocalBackend;

#[cfg(feature = "s3")]
pub use s3::S3Backend;
