//! Mapping of provisioned paths onto object-storage keys

use arstore_models::ProvisionedPath;
use arstore_utils::join_remote;

/// Full object key: optional bucket prefix followed by the relative path
pub fn object_key(prefix: &str, path: &ProvisionedPath) -> String {
    join_remote(prefix, path.as_str())
}

/// Listing prefix matching every object "inside" the directory `path`
pub fn directory_prefix(prefix: &str, path: &ProvisionedPath) -> String {
    format!("{}/", object_key(prefix, path))
}

/// Adds a scheme to a bare `host:port` endpoint
pub fn endpoint_url(endpoint: &str, secure: bool) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else if secure {
        format!("https://{}", endpoint)
    } else {
        format!("http://{}", endpoint)
    }
}

pub fn public_object_url(public_url: &str, key: &str) -> Option<String> {
    match public_url.trim_end_matches('/') {
        "" => None,
        base => Some(format!("{}/{}", base, key)),
    }
}
