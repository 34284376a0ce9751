//! Content store error types.
//!
//! All errors that can occur while resolving, reading, writing or
//! versioning pages are defined here. We use `thiserror` for ergonomic
//! error definition and better error messages.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::types::InvalidTitleError;

/// The main error type for content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The title resolves to a path outside the data root.
    ///
    /// Always rejected, never recovered.
    #[error("title escapes data root: {title}")]
    PathEscape { title: String },

    /// The requested page does not exist.
    #[error("page not found: {0}")]
    NotFound(String),

    /// Invalid page title.
    #[error("invalid title: {0}")]
    InvalidTitle(#[from] InvalidTitleError),

    /// I/O error (filesystem level).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the underlying git library outside the commit step.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// The commit step failed after the page file was written.
    ///
    /// The content is durable on disk but not yet versioned; retrying the
    /// commit alone is safe.
    #[error("commit failed for page {title}: {source}")]
    Commit {
        title: String,
        #[source]
        source: git2::Error,
    },

    /// Pushing to the configured remote failed.
    ///
    /// The local commit remains authoritative.
    #[error("push to {remote} failed: {reason}")]
    Push { remote: String, reason: String },

    /// The data root is not a git repository.
    #[error("repository not initialized: {0}")]
    NotInitialized(PathBuf),

    /// The repository has no commits.
    #[error("repository is empty: no commits found")]
    EmptyRepository,
}

impl StoreError {
    /// Check if this error indicates the page doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this error is a rejected sandbox escape.
    pub fn is_escape(&self) -> bool {
        matches!(self, StoreError::PathEscape { .. })
    }

    /// Check if the save still counts as successful despite this error.
    ///
    /// Only push failures qualify: the local commit is authoritative. A
    /// failed commit fails the save, even though the page file is already
    /// on disk.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, StoreError::Push { .. })
    }
}

/// Result type alias for content store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = StoreError::NotFound("FrontPage".to_string());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_escape());

        let escape = StoreError::PathEscape {
            title: "../../etc/passwd".to_string(),
        };
        assert!(escape.is_escape());
        assert!(!escape.is_non_fatal());

        let push = StoreError::Push {
            remote: "origin".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(push.is_non_fatal());
    }
}
