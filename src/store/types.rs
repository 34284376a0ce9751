//! Core type-safe wrappers used by the content store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use git2::Oid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A git commit identifier for one page revision.
///
/// The inner Oid is only accessible within the store module, so callers
/// cannot feed arbitrary object IDs back into the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionId(pub(crate) Oid);

impl RevisionId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// Parse a RevisionId from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(RevisionId)
    }

    /// Short form of the revision ID.
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error produced when a page title fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTitleError {
    #[error("title cannot be empty")]
    Empty,

    #[error("title too long: {0} bytes (max 512)")]
    TooLong(usize),

    #[error("title contains an illegal character: {0:?}")]
    IllegalChar(char),
}

/// A validated page title.
///
/// Titles are opaque identifiers that double as relative paths, so slashes
/// are allowed (hierarchical pages). Traversal segments like `..` are *not*
/// rejected here; the path resolver refuses them with `PathEscape` so that
/// the sandboxing decision lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageTitle(String);

impl PageTitle {
    const MAX_LEN: usize = 512;

    /// Create a new PageTitle, validating the input.
    pub fn new(title: impl Into<String>) -> Result<Self, InvalidTitleError> {
        let title = title.into();
        Self::validate(&title)?;
        Ok(Self(title))
    }

    fn validate(title: &str) -> Result<(), InvalidTitleError> {
        if title.is_empty() {
            return Err(InvalidTitleError::Empty);
        }

        if title.len() > Self::MAX_LEN {
            return Err(InvalidTitleError::TooLong(title.len()));
        }

        for c in title.chars() {
            if c == '\0' || c.is_control() {
                return Err(InvalidTitleError::IllegalChar(c));
            }
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PageTitle {
    type Err = InvalidTitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PageTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A wiki page as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: PageTitle,
    /// Raw markup bytes, exactly as saved.
    pub body: Vec<u8>,
    /// Filesystem modification time of the last successful save.
    pub modified: DateTime<Utc>,
}

impl Page {
    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Author identity attached to every commit.
#[derive(Debug, Clone)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    /// The default identity used when nothing else is configured.
    pub fn wikistore() -> Self {
        Self {
            name: "wikistore".to_string(),
            email: "wikistore@localhost".to_string(),
        }
    }

    pub(crate) fn to_git2(&self) -> Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::now(&self.name, &self.email)
    }
}

/// One entry in a page's commit history.
#[derive(Debug, Clone)]
pub struct Revision {
    pub id: RevisionId,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

impl Revision {
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let time = commit.time();
        let timestamp = Utc
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            id: RevisionId::new(commit.id()),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("unknown@unknown").to_string(),
            timestamp,
        }
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_titles() {
        assert!(PageTitle::new("FrontPage").is_ok());
        assert!(PageTitle::new("sub/Page").is_ok());
        assert!(PageTitle::new("notes/2024/Retro").is_ok());
        // Traversal is the resolver's call, not the title's.
        assert!(PageTitle::new("../escape").is_ok());
    }

    #[test]
    fn test_invalid_titles() {
        assert_eq!(PageTitle::new(""), Err(InvalidTitleError::Empty));
        assert_eq!(
            PageTitle::new("a\0b"),
            Err(InvalidTitleError::IllegalChar('\0'))
        );
        let long = "x".repeat(600);
        assert!(matches!(
            PageTitle::new(long),
            Err(InvalidTitleError::TooLong(600))
        ));
    }

    #[test]
    fn test_title_parse() {
        let title: PageTitle = "FrontPage".parse().unwrap();
        assert_eq!(title.as_str(), "FrontPage");
    }

    #[test]
    fn test_revision_id_short() {
        let id = RevisionId::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(id.short(), "0123456");
    }
}
