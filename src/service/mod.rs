//! Content service - the orchestrator over store, history and index.
//!
//! A save flows commit-first: the page is written and committed, then the
//! index is updated. The index may lag (a warning, never a failure), but it
//! can never show content that was not durably committed.

use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::config::WikiConfig;
use crate::index::{IndexError, SearchHit, SearchIndex};
use crate::store::{
    Page, PageTitle, Revision, RevisionId, StoreError, VersionedBackend,
};

/// Result type for content service operations.
pub type WikiResult<T> = Result<T, WikiError>;

/// Content service errors.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl WikiError {
    /// Check if this error means the page doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::Store(err) if err.is_not_found())
    }
}

/// A non-fatal degradation attached to an otherwise successful save.
#[derive(Debug, Error)]
pub enum SaveWarning {
    /// The commit exists locally but did not reach the remote.
    #[error("push failed: {0}")]
    PushFailed(String),

    /// The page is committed but the index still shows its previous
    /// content; the next successful update or a rebuild clears this.
    #[error("index drift: page saved but not re-indexed: {0}")]
    IndexDrift(String),
}

/// Receipt for a completed save.
#[derive(Debug)]
pub struct SaveReceipt {
    /// The revision the save produced.
    pub revision: RevisionId,
    /// Modification time of the page file.
    pub modified: chrono::DateTime<chrono::Utc>,
    /// Non-fatal degradations, empty on a fully consistent save.
    pub warnings: Vec<SaveWarning>,
}

impl SaveReceipt {
    /// True when the save committed, pushed (if configured) and indexed.
    pub fn is_fully_consistent(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The index-drift reason, if the index failed to keep up.
    pub fn index_drift(&self) -> Option<&str> {
        self.warnings.iter().find_map(|w| match w {
            SaveWarning::IndexDrift(reason) => Some(reason.as_str()),
            _ => None,
        })
    }
}

/// The content service.
///
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct ContentService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    backend: VersionedBackend,
    index: SearchIndex,
}

impl ContentService {
    /// Open (or initialize) the store and index described by the config.
    ///
    /// The backend's ordering counter is seeded from the persisted index
    /// high-water mark. An empty index over a non-empty store is rebuilt
    /// immediately, so a deleted or fresh index directory heals on startup.
    pub fn open(config: &WikiConfig) -> WikiResult<Self> {
        let backend = VersionedBackend::open_or_init(config)?;
        let index = SearchIndex::open(config.index_path())?;
        backend.seed_sequence(index.last_seq());

        let service = Self {
            inner: Arc::new(ServiceInner { backend, index }),
        };

        if service.inner.index.is_empty() {
            let rebuilt = service.rebuild_index()?;
            if rebuilt > 0 {
                info!("rebuilt search index: {rebuilt} pages");
            }
        }

        Ok(service)
    }

    /// Save a page: commit it, then index it.
    ///
    /// A commit failure propagates unchanged and the index is left alone.
    /// Push and index failures are demoted to warnings on the receipt; the
    /// caller's save has succeeded once the content is durable on disk.
    pub fn save(&self, title: &PageTitle, body: &[u8]) -> WikiResult<SaveReceipt> {
        let receipt = self.inner.backend.commit(title, body)?;
        let mut warnings = Vec::new();

        if let Some(err) = receipt.push.failure() {
            warn!("save {title}: {err}");
            warnings.push(SaveWarning::PushFailed(err.to_string()));
        }

        let text = String::from_utf8_lossy(body);
        if let Err(err) = self.inner.index.update(title.as_str(), &text, receipt.seq) {
            warn!("save {title}: index update failed: {err}");
            warnings.push(SaveWarning::IndexDrift(err.to_string()));
        }

        Ok(SaveReceipt {
            revision: receipt.revision,
            modified: receipt.modified,
            warnings,
        })
    }

    /// Read a page. Never blocked by an in-flight save.
    pub fn read(&self, title: &PageTitle) -> WikiResult<Page> {
        Ok(self.inner.backend.pages().load(title)?)
    }

    /// Ranked full-text search.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.inner.index.query(query)
    }

    /// Commit history for a page, newest first.
    pub fn history(&self, title: &PageTitle, limit: Option<usize>) -> WikiResult<Vec<Revision>> {
        Ok(self.inner.backend.history(title, limit)?)
    }

    /// Rebuild the index from the current store contents.
    ///
    /// Equivalent to updating every existing page in title order. Returns
    /// the number of pages indexed.
    pub fn rebuild_index(&self) -> WikiResult<usize> {
        let titles = self.inner.backend.pages().list_titles()?;
        self.inner.index.clear()?;

        for title in &titles {
            let page = self.inner.backend.pages().load(title)?;
            let seq = self.inner.backend.next_seq();
            self.inner
                .index
                .update(title.as_str(), &page.body_text(), seq)?;
        }

        Ok(titles.len())
    }

    /// Number of pages the index currently covers.
    pub fn indexed_pages(&self) -> usize {
        self.inner.index.len()
    }
}
