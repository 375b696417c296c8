// Store-path normalization utilities
// Fingerprint records always carry forward-slash relative paths so that stores
// written on one platform verify on another

use std::path::{Path, PathBuf};

/// Normalize a path string to forward slashes
/// An empty path normalizes to "."
pub fn normalize(path_str: &str) -> String {
    if path_str.is_empty() {
        return ".".to_string();
    }
    path_str.replace('\\', "/")
}

/// Strip a base prefix from a path string, normalizing both first
///
/// If the normalized path equals the base the result is empty; if the base is
/// not a prefix the normalized path is returned untouched.
pub fn trim_base(path_str: &str, base: &str) -> String {
    let path = normalize(path_str);
    let base = normalize(base);
    let base = base.trim_end_matches('/');

    if base.is_empty() {
        return path;
    }
    if path == base {
        return String::new();
    }
    match path.strip_prefix(&format!("{}/", base)) {
        Some(stripped) => stripped.to_string(),
        None => path,
    }
}

/// Compute the store path for a file: relative to `base`, forward slashes
///
/// Falls back to the normalized absolute path when `base` is not a prefix,
/// mirroring the fallback in the calculate walk.
pub fn to_store_path(path: &Path, base: &Path) -> String {
    let path_str = path.to_string_lossy();
    let base_str = base.to_string_lossy();
    trim_base(&path_str, &base_str)
}

/// Resolve a store path against a base directory for filesystem access
pub fn resolve(store_path: &str, base: &Path) -> PathBuf {
    let relative = Path::new(store_path);
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        base.join(relative)
    }
}

/// Split a store path into (parent directory, file name)
/// The parent of a top-level entry is the empty string
pub fn split_dir_name(store_path: &str) -> (&str, &str) {
    match store_path.rfind('/') {
        Some(idx) => (&store_path[..idx], &store_path[idx + 1..]),
        None => ("", store_path),
    }
}
