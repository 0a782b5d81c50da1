pub mod fingerprint;
pub mod path;

pub use fingerprint::*;
pub use path::*;
