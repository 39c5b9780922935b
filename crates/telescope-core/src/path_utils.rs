//! Path helpers for search roots

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Canonicalize a path, resolving symlinks and producing an absolute path.
///
/// On Windows, uses `dunce::canonicalize` to avoid the `\\?\` extended-length path prefix
/// that `std::fs::canonicalize` produces. Editors cannot open paths with this prefix,
/// and grep output would carry it into every result.
#[cfg(windows)]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    dunce::canonicalize(path)
}

#[cfg(not(windows))]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Root used by a query containing a standalone `~`
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::HomeDirMissing)
}

/// Canonicalize search roots, dropping duplicates. Roots that cannot be
/// resolved are kept verbatim; the grep tool reports them itself.
pub fn resolve_roots<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let mut resolved: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let root = root.as_ref();
        let path = canonicalize(root).unwrap_or_else(|e| {
            tracing::warn!(root = %root.display(), error = %e, "Failed to canonicalize search root");
            root.to_path_buf()
        });
        if !resolved.contains(&path) {
            resolved.push(path);
        }
    }
    resolved
}

/// `path` relative to the first root containing it, for compact display
pub fn relative_to_roots<'a>(path: &'a Path, roots: &[PathBuf]) -> &'a Path {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_roots_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = canonicalize(dir.path()).unwrap();
        let nested = dir.path().join(".");

        let roots = resolve_roots(&[dir.path().to_path_buf(), nested]);
        assert_eq!(roots, vec![canonical]);
    }

    #[test]
    fn test_unresolvable_root_is_kept() {
        let missing = PathBuf::from("/definitely/not/here/telescope");
        assert_eq!(resolve_roots(&[missing.clone()]), vec![missing]);
    }

    #[test]
    #[cfg(not(target_family = "windows"))]
    fn test_relative_to_roots() {
        let roots = vec![PathBuf::from("/proj"), PathBuf::from("/other")];
        assert_eq!(
            relative_to_roots(Path::new("/proj/src/a.rs"), &roots),
            Path::new("src/a.rs")
        );
        assert_eq!(
            relative_to_roots(Path::new("/elsewhere/b.rs"), &roots),
            Path::new("/elsewhere/b.rs")
        );
        assert_eq!(relative_to_roots(Path::new("/proj"), &roots), Path::new("/proj"));
    }
}
