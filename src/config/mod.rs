//! Configuration consumed by the content store and indexing engine.
//!
//! Only the inputs the core actually uses live here: the data root, the
//! index directory, and the git remote settings. Listen addresses, branding
//! and the rest of the web surface belong to the layer above.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension appended to every page file on disk.
pub const FILE_EXTENSION: &str = ".md";

/// Git remote settings.
#[derive(Debug, Clone, Default)]
pub struct GitConfig {
    /// Remote URL for `origin`. No remote is configured when absent.
    pub url: Option<String>,
    /// Push each commit to the remote after it is created locally.
    pub push: bool,
    /// Deadline for a single push attempt.
    pub push_timeout: Duration,
}

impl GitConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            push: false,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }
}

const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Wiki content store configuration.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// Root directory for page files and the git repository.
    pub data_dir: PathBuf,
    /// Directory for the search index. Defaults to `<data_dir>/.index`.
    pub index_dir: Option<PathBuf>,
    /// Remote settings.
    pub git: GitConfig,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".wiki"),
            index_dir: None,
            git: GitConfig {
                url: None,
                push: false,
                push_timeout: DEFAULT_PUSH_TIMEOUT,
            },
        }
    }
}

impl WikiConfig {
    /// Create a configuration rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Override the index directory.
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    /// Configure the git remote URL.
    pub fn remote(mut self, url: impl Into<String>) -> Self {
        self.git.url = Some(url.into());
        self
    }

    /// Enable or disable pushing commits to the remote.
    pub fn push(mut self, value: bool) -> Self {
        self.git.push = value;
        self
    }

    /// Override the push deadline.
    pub fn push_timeout(mut self, timeout: Duration) -> Self {
        self.git.push_timeout = timeout;
        self
    }

    /// Resolved index directory.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(".index"))
    }

    /// The data root.
    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }
}
