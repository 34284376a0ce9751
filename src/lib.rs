//! wikistore - a Git-backed wiki content store with full-text search
//!
//! Pages are plain markup files in a sandboxed directory tree. Every save
//! is one commit in the git repository rooted at the data directory, and a
//! persistent inverted index keeps search results consistent with the
//! store. The HTTP surface, rendering and templating live elsewhere; this
//! crate is the content engine they consume.
//!
//! # Example
//!
//! ```no_run
//! use wikistore::config::WikiConfig;
//! use wikistore::service::ContentService;
//! use wikistore::store::PageTitle;
//!
//! let service = ContentService::open(&WikiConfig::new("./wiki")).unwrap();
//! let title: PageTitle = "FrontPage".parse().unwrap();
//! service.save(&title, b"Hello CamelCase World").unwrap();
//! for hit in service.search("CamelCase") {
//!     println!("{} ({:.3})", hit.title, hit.score);
//! }
//! ```

pub mod config;
pub mod index;
pub mod service;
pub mod store;

pub use config::WikiConfig;
pub use index::{SearchHit, SearchIndex};
pub use service::{ContentService, SaveReceipt, SaveWarning, WikiError, WikiResult};
pub use store::{Page, PageTitle, StoreError, VersionedBackend};
