//! Page file storage.
//!
//! Reads and writes page content through the path resolver. Writes go to a
//! temporary file in the target directory and are renamed into place, so a
//! failed save never leaves a half-written page and readers observe either
//! the old or the new content, nothing in between.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::config::FILE_EXTENSION;
use crate::store::error::{StoreError, StoreResult};
use crate::store::path::PathResolver;
use crate::store::types::{Page, PageTitle};

/// The outcome of a successful save.
#[derive(Debug, Clone)]
pub struct SavedPage {
    /// Root-relative path of the page file, ready for git staging.
    pub rel: PathBuf,
    /// New filesystem modification time.
    pub modified: DateTime<Utc>,
}

/// Reads and writes page files under the data root.
#[derive(Debug, Clone)]
pub struct PageStore {
    resolver: PathResolver,
}

impl PageStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Load a page, returning its body and last-modified time.
    pub fn load(&self, title: &PageTitle) -> StoreResult<Page> {
        let path = self.resolver.resolve(title)?;

        let body = fs::read(&path.abs).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(title.to_string())
            } else {
                StoreError::Io(err)
            }
        })?;

        let modified = fs::metadata(&path.abs)?.modified()?;

        Ok(Page {
            title: title.clone(),
            body,
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Save a page body, overwriting any previous content.
    ///
    /// The write is atomic: temp file in the same directory, restrictive
    /// permissions, fsync, rename.
    pub fn save(&self, title: &PageTitle, body: &[u8]) -> StoreResult<SavedPage> {
        let path = self.resolver.resolve(title)?;
        let dir = path.abs.parent().unwrap_or_else(|| self.resolver.root());

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&path.abs).map_err(|err| StoreError::Io(err.error))?;

        let modified = fs::metadata(&path.abs)?.modified()?;

        Ok(SavedPage {
            rel: path.rel,
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Check whether a page exists without reading it.
    ///
    /// Purely observational: goes through `relative`, not `resolve`, so no
    /// directories are created for a missing hierarchical page.
    pub fn exists(&self, title: &PageTitle) -> bool {
        match self.resolver.relative(title) {
            Ok(rel) => self.resolver.root().join(rel).is_file(),
            Err(_) => false,
        }
    }

    /// List every page title under the root, sorted.
    ///
    /// Dot-directories (`.git`, `.index`) are skipped. Used to rebuild the
    /// search index from the store contents.
    pub fn list_titles(&self) -> StoreResult<Vec<PageTitle>> {
        let root = self.resolver.root();
        let mut titles = Vec::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry.file_name().to_string_lossy().starts_with('.'))
        });

        for entry in walker {
            let entry = entry.map_err(|err| StoreError::Io(err.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };

            let joined = rel
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if let Some(stem) = joined.strip_suffix(FILE_EXTENSION) {
                if let Ok(title) = PageTitle::new(stem) {
                    titles.push(title);
                }
            }
        }

        titles.sort();
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn title(s: &str) -> PageTitle {
        PageTitle::new(s).unwrap()
    }

    fn setup() -> (TempDir, PageStore) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path().join("data")).unwrap();
        (dir, PageStore::new(resolver))
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, store) = setup();
        let before = Utc::now() - chrono::Duration::seconds(2);

        let saved = store.save(&title("FrontPage"), b"Hello CamelCase World").unwrap();
        assert!(saved.modified >= before);

        let page = store.load(&title("FrontPage")).unwrap();
        assert_eq!(page.body, b"Hello CamelCase World");
        assert_eq!(page.modified, saved.modified);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let (_dir, store) = setup();
        store.save(&title("Page"), b"first").unwrap();
        store.save(&title("Page"), b"second").unwrap();

        let page = store.load(&title("Page")).unwrap();
        assert_eq!(page.body, b"second");
    }

    #[test]
    fn test_load_missing_page() {
        let (_dir, store) = setup();
        let err = store.load(&title("NoSuchPage")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_rejects_traversal() {
        let (dir, store) = setup();
        let err = store.save(&title("../../Escape"), b"nope").unwrap_err();
        assert!(err.is_escape());
        assert!(!dir.path().join("Escape.md").exists());
    }

    #[test]
    fn test_hierarchical_save() {
        let (_dir, store) = setup();
        store.save(&title("notes/2024/Retro"), b"body").unwrap();
        let page = store.load(&title("notes/2024/Retro")).unwrap();
        assert_eq!(page.body, b"body");
    }

    #[test]
    fn test_exists_mutates_nothing() {
        let (_dir, store) = setup();

        assert!(!store.exists(&title("a/b/NoPage")));
        // No directories appear for a page that was only asked about.
        assert!(!store.resolver().root().join("a").exists());

        store.save(&title("a/b/Page"), b"body").unwrap();
        assert!(store.exists(&title("a/b/Page")));
        assert!(!store.exists(&title("../Escape")));
    }

    #[test]
    fn test_list_titles_sorted_and_stripped() {
        let (_dir, store) = setup();
        store.save(&title("Zebra"), b"z").unwrap();
        store.save(&title("Apple"), b"a").unwrap();
        store.save(&title("sub/Nested"), b"n").unwrap();

        let titles = store.list_titles().unwrap();
        let names: Vec<_> = titles.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra", "sub/Nested"]);
    }

    #[test]
    fn test_list_titles_skips_dot_directories() {
        let (_dir, store) = setup();
        store.save(&title("Visible"), b"v").unwrap();
        let hidden = store.resolver().root().join(".index");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("shadow.md"), b"not a page").unwrap();

        let titles = store.list_titles().unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].as_str(), "Visible");
    }

    #[cfg(unix)]
    #[test]
    fn test_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = setup();
        store.save(&title("Secret"), b"hush").unwrap();

        let path = store.resolver().resolve(&title("Secret")).unwrap();
        let mode = fs::metadata(path.abs).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
