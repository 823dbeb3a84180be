/*!
 * Logical Paths
 * Helpers for the slash-rooted mutable namespace and prefixed archive URLs
 */

use std::path::Path;

/// Separator between a bundled prefix and the archive-relative path
pub const BUNDLED_SEPARATOR: &str = "://";

/// Root of the mutable namespace
pub const ROOT: &str = "/";

/// Make a mutable-namespace path absolute and collapse `.`, `..` and
/// repeated separators
pub fn clean_absolute(path: &str) -> String {
    let rooted = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    path_clean::clean(Path::new(&rooted))
        .to_string_lossy()
        .into_owned()
}

/// Join a relative path onto a logical directory
pub fn join(base: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches('/');
    if rel.is_empty() {
        return clean_absolute(base);
    }
    clean_absolute(&format!("{}/{}", base.trim_end_matches('/'), rel))
}

/// Parent directory of a cleaned absolute path (`/` is its own parent)
pub fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => ROOT.to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Last component of a path; the root yields `/`
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ROOT;
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Path of `path` relative to `base`, both cleaned absolute; `None` when
/// `path` is not inside `base`
pub fn relative_to<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base == ROOT {
        return Some(path.trim_start_matches('/'));
    }
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// True when the pattern uses glob metacharacters
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Longest leading directory of a glob pattern that has no metacharacters
pub fn literal_base(pattern: &str) -> String {
    let mut base = String::new();
    for component in pattern.split('/').filter(|c| !c.is_empty()) {
        if is_glob(component) {
            break;
        }
        base.push('/');
        base.push_str(component);
    }
    if base.is_empty() {
        ROOT.to_string()
    } else {
        base
    }
}

/// Normalize an archive-relative path: no leading slash, `""` for the root
pub fn to_archive_path(rel: &str) -> String {
    let cleaned = clean_absolute(rel);
    cleaned.trim_start_matches('/').to_string()
}
