use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically (without filesystem access).
///
/// `.` segments, repeated and trailing separators are dropped, and `..` pops
/// the previous segment but never climbs above the filesystem root.
pub fn normalize_path_lexically(path: &Path) -> PathBuf {
    let mut stack = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => stack.push(component),
            },
            c => stack.push(c),
        }
    }

    stack.iter().collect()
}

/// Resolve `path` against `root` and normalize the result.
///
/// Absolute inputs are only normalized, so feeding the output back in is a no-op.
pub(crate) fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path_lexically(path)
    } else {
        normalize_path_lexically(&root.join(path))
    }
}

/// Segment-wise containment: `root` itself and its descendants match, a
/// sibling that merely shares a string prefix (`/tmp/sb` vs `/tmp/sbx`) does not.
pub(crate) fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Absolute, normalized form of a caller-supplied root. Relative roots are
/// anchored at the current working directory.
pub(crate) fn absolutize_root(root: &Path) -> std::io::Result<PathBuf> {
    Ok(normalize_path_lexically(&std::path::absolute(root)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_removes_dot() {
        let path = Path::new("/a/./b/./c");
        assert_eq!(normalize_path_lexically(path), PathBuf::from("/a/b/c"));
    }

    #[test]
    fn test_normalize_path_removes_dotdot() {
        let path = Path::new("/a/b/../c");
        assert_eq!(normalize_path_lexically(path), PathBuf::from("/a/c"));
    }

    #[test]
    fn test_normalize_path_dotdot_stops_at_root() {
        let path = Path::new("/a/../..");
        assert_eq!(normalize_path_lexically(path), PathBuf::from("/"));
    }

    #[test]
    fn test_normalize_path_trailing_separators() {
        let path = Path::new("/a/b//");
        assert_eq!(normalize_path_lexically(path), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_relative_keeps_leading_dotdot() {
        let path = Path::new("../x/./y");
        assert_eq!(normalize_path_lexically(path), PathBuf::from("../x/y"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_against_is_idempotent() {
        let root = Path::new("/sandbox/root");
        let once = resolve_against(root, Path::new("a/b/sample.txt"));
        let twice = resolve_against(root, &once);
        assert_eq!(once, PathBuf::from("/sandbox/root/a/b/sample.txt"));
        assert_eq!(once, twice);
    }

    #[cfg(unix)]
    #[test]
    fn test_is_within_is_segment_aware() {
        let root = Path::new("/sandbox/root");
        assert!(is_within(Path::new("/sandbox/root"), root));
        assert!(is_within(Path::new("/sandbox/root/child"), root));
        assert!(!is_within(Path::new("/sandbox/rootx"), root));
        assert!(!is_within(Path::new("/sandbox"), root));
    }
}
