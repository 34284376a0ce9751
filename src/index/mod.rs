//! Full-text search index for wiki pages.
//!
//! An inverted index over page titles and bodies, persisted as JSON in the
//! configured index directory. Consistency with the content store is
//! eventual within one save cycle: updates are ordered by commit sequence
//! numbers and a full rebuild from the store is always available.

mod error;
mod inverted;
mod tokenize;

// Re-export public API
pub use error::{IndexError, IndexResult};
pub use inverted::{SearchHit, SearchIndex};
pub use tokenize::{term_frequencies, tokenize};
