/// Namespace for the local filesystem primitives shared by the local-disk
/// adapter and the configuration persistence layer
pub struct FileSystem;
