//! URL path resolution

/// Resolve `relative` against the file `base`.
///
/// The last segment of `base` (the file name) is dropped, then each segment
/// of `relative` is applied: `..` pops, `.` and empty segments are skipped,
/// anything else is appended. An empty `base` or an absolute `relative` is
/// returned unchanged.
pub fn resolve(relative: &str, base: &str) -> String {
    if base.is_empty() || relative.starts_with('/') {
        return relative.to_string();
    }

    let mut parts: Vec<&str> = base.split('/').collect();
    parts.pop();

    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    parts.join("/")
}

/// Pick the base for an import: the importing file for `./` and `../`
/// paths, the configured base URL for everything else.
pub fn resolve_import(path: &str, parent_url: &str, base_url: &str) -> String {
    let base = if path.starts_with('.') {
        parent_url
    } else {
        base_url
    };
    resolve(path, base)
}

/// Component name for a path: the file name without its extension.
pub fn get_name(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    }
}
