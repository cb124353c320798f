//! Path comparison helpers
//!
//! Local paths reported by the version-control client and paths supplied by
//! callers are compared as plain strings. On case-insensitive platforms both
//! sides are folded to lowercase first.

use std::borrow::Cow;
use std::path::Path;

/// Fold a path string for comparison
#[must_use]
pub fn fold(path: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(path.to_lowercase())
    } else {
        Cow::Borrowed(path)
    }
}

/// Compare two path strings, optionally ignoring case
#[must_use]
pub fn paths_equal(a: &str, b: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        a == b || a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Check whether `path` lies under `root`
///
/// The test is component-wise, so `/ws/projectile` is not under `/ws/project`.
#[must_use]
pub fn is_under_root(path: &Path, root: &Path, case_insensitive: bool) -> bool {
    if root.as_os_str().is_empty() {
        return false;
    }

    if !case_insensitive {
        return path.starts_with(root);
    }

    let path = path.to_string_lossy().to_lowercase();
    let root = root.to_string_lossy().to_lowercase();
    Path::new(&path).starts_with(Path::new(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_root_simple() {
        assert!(is_under_root(
            Path::new("/ws/art/hero.fbx"),
            Path::new("/ws"),
            false
        ));
        assert!(!is_under_root(
            Path::new("/other/hero.fbx"),
            Path::new("/ws"),
            false
        ));
    }

    #[test]
    fn test_under_root_is_component_wise() {
        assert!(!is_under_root(
            Path::new("/ws/projectile/a.txt"),
            Path::new("/ws/project"),
            false
        ));
    }

    #[test]
    fn test_under_root_case_rules() {
        let path = Path::new("/WS/Art/hero.fbx");
        let root = Path::new("/ws/art");
        assert!(!is_under_root(path, root, false));
        assert!(is_under_root(path, root, true));
    }

    #[test]
    fn test_empty_root_never_matches() {
        assert!(!is_under_root(Path::new("/ws/a"), Path::new(""), false));
    }

    #[test]
    fn test_paths_equal() {
        assert!(paths_equal("//depot/A.txt", "//depot/A.txt", false));
        assert!(!paths_equal("//depot/A.txt", "//depot/a.txt", false));
        assert!(paths_equal("//depot/A.txt", "//depot/a.txt", true));
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("C:\\Work\\X", true), "c:\\work\\x");
        assert_eq!(fold("C:\\Work\\X", false), "C:\\Work\\X");
    }
}
