//! Title-to-path resolution with traversal sandboxing.
//!
//! Page titles double as relative filesystem paths, so every resolution
//! must be proven to stay inside the data root. The check runs on fully
//! normalized paths and compares whole components; a naive string prefix
//! test would accept `/data-evil` as being under `/data`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::FILE_EXTENSION;
use crate::store::error::{StoreError, StoreResult};
use crate::store::types::PageTitle;

/// A resolved page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    /// Path relative to the data root, used for git staging.
    pub rel: PathBuf,
    /// Absolute path on disk.
    pub abs: PathBuf,
}

/// Resolves page titles into sandboxed filesystem paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at the given directory.
    ///
    /// The root is created if absent and canonicalized so later prefix
    /// checks compare real paths, not whatever spelling the caller used.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// The canonicalized data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize a title into a root-relative file path.
    ///
    /// Purely lexical: `.` segments are dropped, `..` pops the previous
    /// segment, and any `..` that would pop past the root fails with
    /// `PathEscape`. Absolute titles and drive prefixes are rejected the
    /// same way. No filesystem access.
    pub fn relative(&self, title: &PageTitle) -> StoreResult<PathBuf> {
        let candidate = PathBuf::from(format!("{}{}", title.as_str(), FILE_EXTENSION));

        let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
        for component in candidate.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(StoreError::PathEscape {
                            title: title.to_string(),
                        });
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::PathEscape {
                        title: title.to_string(),
                    });
                }
            }
        }

        if parts.is_empty() {
            return Err(StoreError::PathEscape {
                title: title.to_string(),
            });
        }

        Ok(parts.iter().collect())
    }

    /// Resolve a title into an on-disk location, creating intermediate
    /// directories as needed (hierarchical titles contain separators).
    ///
    /// May create directories, never files.
    pub fn resolve(&self, title: &PageTitle) -> StoreResult<PagePath> {
        let rel = self.relative(title)?;
        let abs = self.root.join(&rel);

        // The relative path is already normalized, so this holds by
        // construction; keep it as a final component-wise guard.
        if !abs.starts_with(&self.root) {
            return Err(StoreError::PathEscape {
                title: title.to_string(),
            });
        }

        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(PagePath { rel, abs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn title(s: &str) -> PageTitle {
        PageTitle::new(s).unwrap()
    }

    fn setup() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path().join("data")).unwrap();
        (dir, resolver)
    }

    #[test]
    fn test_simple_title() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve(&title("FrontPage")).unwrap();
        assert_eq!(path.rel, PathBuf::from("FrontPage.md"));
        assert_eq!(path.abs, resolver.root().join("FrontPage.md"));
    }

    #[test]
    fn test_hierarchical_title_creates_directories() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve(&title("sub/Page")).unwrap();
        assert_eq!(path.rel, PathBuf::from("sub/Page.md"));
        assert!(resolver.root().join("sub").is_dir());
        // Only the directory exists, not the file.
        assert!(!path.abs.exists());
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, resolver) = setup();
        for t in ["../../etc/passwd", "../sibling", "a/../../b", "../data"] {
            let err = resolver.resolve(&title(t)).unwrap_err();
            assert!(err.is_escape(), "expected escape for {t:?}, got {err}");
        }
    }

    #[test]
    fn test_traversal_within_root_allowed() {
        let (_dir, resolver) = setup();
        // Pops back down to the root level but never above it.
        let path = resolver.resolve(&title("a/../FrontPage")).unwrap();
        assert_eq!(path.rel, PathBuf::from("FrontPage.md"));
    }

    #[test]
    fn test_absolute_title_rejected() {
        let (_dir, resolver) = setup();
        let err = resolver.resolve(&title("/etc/passwd")).unwrap_err();
        assert!(err.is_escape());
    }

    #[test]
    fn test_prefix_collision_with_sibling_directory() {
        // `/tmp/xxx/data-evil` must never be treated as inside `/tmp/xxx/data`.
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path().join("data")).unwrap();
        fs::create_dir_all(dir.path().join("data-evil")).unwrap();

        let err = resolver.resolve(&title("../data-evil/Page")).unwrap_err();
        assert!(err.is_escape());
        assert!(!dir.path().join("data-evil/Page.md").exists());
    }

    #[test]
    fn test_rejected_resolution_mutates_nothing() {
        let (_dir, resolver) = setup();
        let before: Vec<_> = fs::read_dir(resolver.root()).unwrap().collect();
        let _ = resolver.resolve(&title("../../outside/Page"));
        let after: Vec<_> = fs::read_dir(resolver.root()).unwrap().collect();
        assert_eq!(before.len(), after.len());
    }
}
