/// Whether `path` needs an authenticated user.
///
/// The path is compared with a trailing slash added. An excluded entry
/// exempts it when the entry equals that path, or when the part of the entry
/// before any `*` is a prefix of it. An empty path or an empty exclusion
/// list always requires authentication.
pub fn require_auth<S: AsRef<str>>(path: &str, excluded_paths: &[S]) -> bool {
    if path.is_empty() || excluded_paths.is_empty() {
        return true;
    }

    let path = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };

    !excluded_paths.iter().any(|entry| {
        let entry = entry.as_ref();
        let stem = entry.split('*').next().unwrap_or(entry);
        entry == path || path.starts_with(stem)
    })
}
