//! Content store for wiki pages.
//!
//! This module provides the sandboxed, version-controlled page store. The
//! layers above (the content service, the web surface) use this API and
//! never touch git2 or the filesystem directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              VersionedBackend                │
//! │   (write + stage + commit + optional push)   │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │  PageStore   │   atomic page file reads/writes
//!               └──────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │ PathResolver │   title → sandboxed path
//!               └──────────────┘
//! ```

mod error;
mod git;
mod pages;
mod path;
mod types;

// Re-export public API
pub use error::{StoreError, StoreResult};
pub use git::{CommitReceipt, PushStatus, VersionedBackend};
pub use pages::{PageStore, SavedPage};
pub use path::{PagePath, PathResolver};
pub use types::{CommitAuthor, InvalidTitleError, Page, PageTitle, Revision, RevisionId};
