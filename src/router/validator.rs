//! Path-info validation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest path the default validator accepts
pub const MAX_PATH_LEN: usize = 2048;

static PATH_CHARS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/[A-Za-z0-9_\-./~%]*$").ok());

/// Decides whether a controller-relative path is acceptable at all.
pub trait PathValidator: Send + Sync {
    fn is_valid_path_info(&self, path: &str) -> bool;
}

/// Conservative validator for admin UI paths.
///
/// Rejects empty paths, paths without a leading `/`, `..` segments, control
/// characters, over-long paths and anything outside `[A-Za-z0-9_-./~%]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathValidator;

impl PathValidator for DefaultPathValidator {
    fn is_valid_path_info(&self, path: &str) -> bool {
        if path.is_empty() || path.len() > MAX_PATH_LEN || !path.starts_with('/') {
            return false;
        }
        if path.chars().any(char::is_control) {
            return false;
        }
        if path.split('/').any(|segment| segment == "..") {
            return false;
        }
        match PATH_CHARS.as_ref() {
            Some(re) => re.is_match(path),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_paths() {
        let v = DefaultPathValidator;
        assert!(v.is_valid_path_info("/"));
        assert!(v.is_valid_path_info("/hooks"));
        assert!(v.is_valid_path_info("/hooks.json"));
        assert!(v.is_valid_path_info("/modules/run/"));
        assert!(v.is_valid_path_info("/file%20name"));
    }

    #[test]
    fn test_rejects_traversal_and_junk() {
        let v = DefaultPathValidator;
        assert!(!v.is_valid_path_info(""));
        assert!(!v.is_valid_path_info("hooks"));
        assert!(!v.is_valid_path_info("/../etc/passwd"));
        assert!(!v.is_valid_path_info("/a/.."));
        assert!(!v.is_valid_path_info("/a\nb"));
        assert!(!v.is_valid_path_info("/<script>"));
        assert!(!v.is_valid_path_info("/a b"));
    }

    #[test]
    fn test_length_limit() {
        let v = DefaultPathValidator;
        let ok = format!("/{}", "a".repeat(MAX_PATH_LEN - 1));
        let long = format!("/{}", "a".repeat(MAX_PATH_LEN));
        assert!(v.is_valid_path_info(&ok));
        assert!(!v.is_valid_path_info(&long));
    }

    #[test]
    fn test_dotted_names_are_not_traversal() {
        let v = DefaultPathValidator;
        assert!(v.is_valid_path_info("/..hidden"));
        assert!(v.is_valid_path_info("/a.../b"));
    }
}
