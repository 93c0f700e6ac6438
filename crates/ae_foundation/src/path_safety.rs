//! Shared path-sandboxing logic: every path a pipeline/sampler script or a
//! build recipe supplies must resolve underneath a fixed root without
//! escaping it via `..`.

use std::path::{Component, Path, PathBuf};

/// Resolve `candidate` relative to `root` and confirm the result stays
/// underneath `root` — no `..` component may walk the result back outside.
///
/// This does not require either path to exist on disk; it is a purely
/// lexical check, since both the pipeline compiler and the build server
/// need to validate paths before the directories they name are created.
pub fn resolve_sandboxed(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let joined = if candidate.is_absolute() { candidate.to_path_buf() } else { root.join(candidate) };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }

    if normalized.starts_with(root) {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_inside_root_resolves() {
        let root = Path::new("/work/build-abc");
        let resolved = resolve_sandboxed(root, Path::new("src/main.cpp")).unwrap();
        assert_eq!(resolved, Path::new("/work/build-abc/src/main.cpp"));
    }

    #[test]
    fn dot_dot_escape_is_rejected() {
        let root = Path::new("/work/build-abc");
        assert!(resolve_sandboxed(root, Path::new("../../etc/passwd")).is_none());
    }

    #[test]
    fn dot_dot_that_stays_inside_root_is_allowed() {
        let root = Path::new("/work/build-abc");
        let resolved = resolve_sandboxed(root, Path::new("src/../include/foo.h")).unwrap();
        assert_eq!(resolved, Path::new("/work/build-abc/include/foo.h"));
    }
}
