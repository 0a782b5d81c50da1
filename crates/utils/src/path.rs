/// Joins a configured remote base (bucket prefix, cloud folder) with a relative path.
///
/// Slashes around `base` are ignored; an empty base yields `relative` unchanged.
pub fn join_remote(base: &str, relative: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", base, relative)
    }
}
