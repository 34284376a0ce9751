//! Version-control backend for page saves.
//!
//! Every save becomes one commit on the repository rooted at the data
//! directory. A single mutex guards the write+stage+commit+push critical
//! section: libgit2 does not support concurrent commit creation, and
//! keeping the page write inside the lock makes commit order equal write
//! order for any one title. Reads never take the lock.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use git2::{PushOptions, RemoteCallbacks, Repository, Sort};
use parking_lot::Mutex;

use crate::config::WikiConfig;
use crate::store::error::{StoreError, StoreResult};
use crate::store::pages::PageStore;
use crate::store::path::PathResolver;
use crate::store::types::{CommitAuthor, PageTitle, Revision, RevisionId};

const REMOTE_NAME: &str = "origin";

/// Remote propagation settings, resolved from configuration.
#[derive(Debug, Clone)]
struct RemoteSettings {
    url: String,
    push: bool,
    timeout: Duration,
}

/// Outcome of the optional push step of a commit.
#[derive(Debug)]
pub enum PushStatus {
    /// No remote configured, or push disabled.
    Skipped,
    /// The commit reached the remote.
    Pushed,
    /// The push failed; the local commit remains authoritative.
    Failed(StoreError),
}

impl PushStatus {
    pub fn failure(&self) -> Option<&StoreError> {
        match self {
            PushStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Receipt for one committed save.
#[derive(Debug)]
pub struct CommitReceipt {
    /// The new revision.
    pub revision: RevisionId,
    /// Modification time of the written page file.
    pub modified: chrono::DateTime<chrono::Utc>,
    /// Index ordering sequence number, allocated in commit order.
    pub seq: u64,
    /// What happened to the optional remote push.
    pub push: PushStatus,
}

/// The versioned content backend.
///
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct VersionedBackend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    repo: Mutex<Repository>,
    pages: PageStore,
    author: CommitAuthor,
    remote: Option<RemoteSettings>,
    sequence: AtomicU64,
}

impl VersionedBackend {
    /// Open the repository at the configured data root, initializing it
    /// (with an empty root commit) on first use.
    pub fn open_or_init(config: &WikiConfig) -> StoreResult<Self> {
        let root = config.data_path();
        std::fs::create_dir_all(root)?;

        let repo = if root.join(".git").exists() {
            Repository::open(root)
                .map_err(|_| StoreError::NotInitialized(root.to_path_buf()))?
        } else {
            let repo = Repository::init(root)?;
            create_root_commit(&repo, &CommitAuthor::wikistore())?;
            repo
        };

        let remote = match &config.git.url {
            Some(url) => {
                configure_remote(&repo, url)?;
                Some(RemoteSettings {
                    url: url.clone(),
                    push: config.git.push,
                    timeout: config.git.push_timeout,
                })
            }
            None => None,
        };

        let resolver = PathResolver::new(root)?;

        Ok(Self {
            inner: Arc::new(BackendInner {
                repo: Mutex::new(repo),
                pages: PageStore::new(resolver),
                author: CommitAuthor::wikistore(),
                remote,
                sequence: AtomicU64::new(0),
            }),
        })
    }

    /// The underlying page store. Reads go through here directly and are
    /// never blocked by an in-flight commit.
    pub fn pages(&self) -> &PageStore {
        &self.inner.pages
    }

    /// Seed the sequence counter from a persisted high-water mark.
    ///
    /// Must be called before the first commit after opening, or index
    /// updates would be mistaken for stale ones.
    pub fn seed_sequence(&self, last: u64) {
        self.inner.sequence.store(last, Ordering::SeqCst);
    }

    /// Allocate the next ordering sequence number.
    pub fn next_seq(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Write a page and commit it as one revision.
    ///
    /// The filesystem write happens first; if the commit step then fails,
    /// the new content is already durable on disk and the error comes back
    /// as `StoreError::Commit`. A push failure is carried in the receipt
    /// instead of an error, since local durability must not depend on
    /// network reachability.
    pub fn commit(&self, title: &PageTitle, body: &[u8]) -> StoreResult<CommitReceipt> {
        let repo = self.inner.repo.lock();

        let saved = self.inner.pages.save(title, body)?;

        let revision = commit_page(&repo, &saved.rel, title, &self.inner.author)
            .map_err(|source| StoreError::Commit {
                title: title.to_string(),
                source,
            })?;

        let seq = self.next_seq();

        let push = match &self.inner.remote {
            Some(remote) if remote.push => match push_head(&repo, remote.timeout) {
                Ok(()) => PushStatus::Pushed,
                Err(err) => PushStatus::Failed(StoreError::Push {
                    remote: remote.url.clone(),
                    reason: err.message().to_string(),
                }),
            },
            _ => PushStatus::Skipped,
        };

        Ok(CommitReceipt {
            revision,
            modified: saved.modified,
            seq,
            push,
        })
    }

    /// The current HEAD revision.
    pub fn head(&self) -> StoreResult<RevisionId> {
        let repo = self.inner.repo.lock();
        head_revision(&repo)
    }

    /// Commit history for one page, newest first.
    ///
    /// A commit is part of a page's history when its tree entry for the
    /// page differs from the first parent's.
    pub fn history(
        &self,
        title: &PageTitle,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Revision>> {
        let rel = self.inner.pages.resolver().relative(title)?;
        let repo = self.inner.repo.lock();

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut revisions = Vec::new();
        for oid in walk {
            let commit = repo.find_commit(oid?)?;
            if touches_path(&commit, &rel)? {
                revisions.push(Revision::from_git2(&commit));
                if limit.is_some_and(|n| revisions.len() >= n) {
                    break;
                }
            }
        }

        Ok(revisions)
    }
}

fn head_revision(repo: &Repository) -> StoreResult<RevisionId> {
    let head = repo.head().map_err(|err| {
        if err.code() == git2::ErrorCode::UnbornBranch {
            StoreError::EmptyRepository
        } else {
            StoreError::Git(err)
        }
    })?;

    let commit = head.peel_to_commit()?;
    Ok(RevisionId::new(commit.id()))
}

/// Stage one page file and commit it onto HEAD.
fn commit_page(
    repo: &Repository,
    rel: &Path,
    title: &PageTitle,
    author: &CommitAuthor,
) -> Result<RevisionId, git2::Error> {
    let mut index = repo.index()?;
    index.add_path(rel)?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let sig = author.to_git2()?;
    let parent = repo.head()?.peel_to_commit()?;
    let message = format!("update: {title}");

    let oid = repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &[&parent])?;
    Ok(RevisionId::new(oid))
}

/// Create the empty root commit for a freshly initialized repository.
fn create_root_commit(repo: &Repository, author: &CommitAuthor) -> StoreResult<RevisionId> {
    let tree_id = repo.index()?.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let sig = author.to_git2()?;

    let oid = repo.commit(Some("HEAD"), &sig, &sig, "wiki: initialize content root", &tree, &[])?;
    Ok(RevisionId::new(oid))
}

/// Point `origin` at the configured URL, creating it if needed.
fn configure_remote(repo: &Repository, url: &str) -> StoreResult<()> {
    match repo.find_remote(REMOTE_NAME) {
        Ok(remote) => {
            if remote.url() != Some(url) {
                repo.remote_set_url(REMOTE_NAME, url)?;
            }
        }
        Err(_) => {
            repo.remote(REMOTE_NAME, url)?;
        }
    }
    Ok(())
}

/// Push HEAD to `origin` with a bounded deadline.
///
/// The deadline is enforced through the progress callbacks: once it passes,
/// the transfer is aborted and the push fails. libgit2 exposes no connect
/// timeout, so a push that stalls before the first callback fires (DNS
/// lookup, TCP connect) is not covered by the deadline. No automatic retry;
/// that policy belongs to the caller's scheduler.
fn push_head(repo: &Repository, timeout: Duration) -> Result<(), git2::Error> {
    let head = repo.head()?;
    let refname = head
        .name()
        .ok_or_else(|| git2::Error::from_str("HEAD ref name is not valid utf-8"))?
        .to_string();
    let refspec = format!("{refname}:{refname}");

    let deadline = Instant::now() + timeout;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.transfer_progress(move |_| Instant::now() < deadline);
    callbacks.sideband_progress(move |_| Instant::now() < deadline);
    callbacks.push_update_reference(|name, status| match status {
        Some(reason) => Err(git2::Error::from_str(&format!(
            "remote rejected {name}: {reason}"
        ))),
        None => Ok(()),
    });

    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);

    let mut remote = repo.find_remote(REMOTE_NAME)?;
    remote.push(&[refspec.as_str()], Some(&mut options))
}

/// Did this commit change the file at `rel`, relative to its first parent?
fn touches_path(commit: &git2::Commit<'_>, rel: &Path) -> Result<bool, git2::Error> {
    let entry = commit.tree()?.get_path(rel).ok().map(|e| e.id());

    match commit.parent(0) {
        Ok(parent) => {
            let previous = parent.tree()?.get_path(rel).ok().map(|e| e.id());
            Ok(entry != previous)
        }
        Err(_) => Ok(entry.is_some()),
    }
}
