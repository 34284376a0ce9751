//! Inverted full-text index over page titles and bodies.
//!
//! The index maps terms to the pages containing them, with per-page term
//! frequencies for ranking. It is kept consistent with the content store
//! through sequence numbers allocated in commit order: an update carrying
//! a stale sequence never overwrites a newer entry, so last-writer-wins
//! follows commit order rather than wall-clock arrival.
//!
//! The whole index is persisted as one JSON file in the index directory,
//! written with the same temp-file-and-rename discipline as page files.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::index::error::{IndexError, IndexResult};
use crate::index::tokenize::{term_frequencies, tokenize};

const INDEX_FILE: &str = "index.json";

/// Title terms count this many times more than body terms.
const TITLE_WEIGHT: u32 = 3;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub score: f64,
}

/// Indexed state for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocEntry {
    /// Commit-order sequence number this entry was derived from.
    seq: u64,
    /// When the entry was last written.
    indexed_at: DateTime<Utc>,
    /// Total weighted term count, the ranking denominator.
    term_count: u32,
    /// Weighted term frequencies.
    terms: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexInner {
    /// High-water sequence number across all entries.
    seq: u64,
    docs: BTreeMap<String, DocEntry>,
    /// term → title → weighted frequency. Rebuilt from `docs` on load.
    #[serde(skip)]
    postings: HashMap<String, BTreeMap<String, u32>>,
}

impl IndexInner {
    fn rebuild_postings(&mut self) {
        self.postings.clear();
        for (title, entry) in &self.docs {
            for (term, freq) in &entry.terms {
                self.postings
                    .entry(term.clone())
                    .or_default()
                    .insert(title.clone(), *freq);
            }
        }
    }

    fn unlink(&mut self, title: &str) {
        if let Some(entry) = self.docs.remove(title) {
            for term in entry.terms.keys() {
                if let Some(titles) = self.postings.get_mut(term) {
                    titles.remove(title);
                    if titles.is_empty() {
                        self.postings.remove(term);
                    }
                }
            }
        }
    }
}

/// The full-text search index.
///
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct SearchIndex {
    shared: Arc<Shared>,
}

struct Shared {
    file: PathBuf,
    state: RwLock<IndexInner>,
}

impl SearchIndex {
    /// Open the index in the given directory, loading any persisted state.
    pub fn open(dir: impl AsRef<Path>) -> IndexResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let file = dir.join(INDEX_FILE);

        let mut inner = if file.is_file() {
            serde_json::from_slice::<IndexInner>(&fs::read(&file)?)?
        } else {
            IndexInner::default()
        };
        inner.rebuild_postings();

        Ok(Self {
            shared: Arc::new(Shared {
                file,
                state: RwLock::new(inner),
            }),
        })
    }

    /// Index a page, replacing any prior entry for the title.
    ///
    /// Returns `false` when `seq` is older than the stored entry: the
    /// update is stale and the newer entry stays. Identical content
    /// re-indexed with a newer sequence is a no-op apart from the
    /// timestamp.
    pub fn update(&self, title: &str, text: &str, seq: u64) -> IndexResult<bool> {
        let mut terms = term_frequencies(text);
        for term in tokenize(title) {
            *terms.entry(term).or_insert(0) += TITLE_WEIGHT;
        }
        let term_count: u32 = terms.values().sum();

        let mut state = self.shared.state.write();

        if let Some(existing) = state.docs.get(title) {
            if existing.seq > seq {
                return Ok(false);
            }
        }

        state.unlink(title);
        for (term, freq) in &terms {
            state
                .postings
                .entry(term.clone())
                .or_default()
                .insert(title.to_string(), *freq);
        }
        state.docs.insert(
            title.to_string(),
            DocEntry {
                seq,
                indexed_at: Utc::now(),
                term_count,
                terms,
            },
        );
        state.seq = state.seq.max(seq);

        self.persist(&state)?;
        Ok(true)
    }

    /// Drop all entries for a title.
    pub fn remove(&self, title: &str) -> IndexResult<()> {
        let mut state = self.shared.state.write();
        state.unlink(title);
        self.persist(&state)
    }

    /// Ranked query: matches scored by summed relative term frequency,
    /// most relevant first, ties broken by title order.
    ///
    /// An empty result is not an error.
    pub fn query(&self, text: &str) -> Vec<SearchHit> {
        let mut query_terms = tokenize(text);
        query_terms.sort();
        query_terms.dedup();

        let state = self.shared.state.read();
        let mut scores: BTreeMap<&str, f64> = BTreeMap::new();

        for term in &query_terms {
            if let Some(titles) = state.postings.get(term) {
                for (title, freq) in titles {
                    let entry = &state.docs[title.as_str()];
                    let weight = f64::from(*freq) / f64::from(entry.term_count.max(1));
                    *scores.entry(title.as_str()).or_insert(0.0) += weight;
                }
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .map(|(title, score)| SearchHit {
                title: title.to_string(),
                score,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });

        hits
    }

    /// Drop every entry. The sequence high-water mark survives so rebuilds
    /// stay ordered against concurrent saves.
    pub fn clear(&self) -> IndexResult<()> {
        let mut state = self.shared.state.write();
        state.docs.clear();
        state.postings.clear();
        self.persist(&state)
    }

    /// Number of indexed pages.
    pub fn len(&self) -> usize {
        self.shared.state.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest sequence number ever applied.
    pub fn last_seq(&self) -> u64 {
        self.shared.state.read().seq
    }

    /// Write the index file atomically. Called with the write lock held so
    /// the on-disk order matches the applied order.
    fn persist(&self, state: &IndexInner) -> IndexResult<()> {
        let dir = self
            .shared
            .file
            .parent()
            .ok_or_else(|| IndexError::Io(std::io::Error::other("index file has no parent")))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, state)?;
        tmp.flush()?;
        tmp.persist(&self.shared.file)
            .map_err(|err| IndexError::Io(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SearchIndex) {
        let dir = TempDir::new().unwrap();
        let index = SearchIndex::open(dir.path().join("idx")).unwrap();
        (dir, index)
    }

    #[test]
    fn test_update_then_query() {
        let (_dir, index) = setup();
        index.update("FrontPage", "Hello CamelCase World", 1).unwrap();

        let hits = index.query("CamelCase");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "FrontPage");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_title_terms_are_searchable() {
        let (_dir, index) = setup();
        index.update("recipes/Pancakes", "flour and milk", 1).unwrap();

        let hits = index.query("pancakes");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "recipes/Pancakes");
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let (_dir, index) = setup();
        index.update("Page", "some words", 1).unwrap();
        assert!(index.query("absent").is_empty());
        assert!(index.query("").is_empty());
    }

    #[test]
    fn test_idempotent_update() {
        let (_dir, index) = setup();
        index.update("Page", "same body text", 1).unwrap();
        let once = index.query("body");

        index.update("Page", "same body text", 2).unwrap();
        let twice = index.query("body");

        assert_eq!(once, twice);
    }

    #[test]
    fn test_update_replaces_prior_entry() {
        let (_dir, index) = setup();
        index.update("Page", "ancient words", 1).unwrap();
        index.update("Page", "modern words", 2).unwrap();

        assert!(index.query("ancient").is_empty());
        assert_eq!(index.query("modern").len(), 1);
    }

    #[test]
    fn test_stale_update_ignored() {
        let (_dir, index) = setup();
        index.update("Page", "newer body", 5).unwrap();
        let applied = index.update("Page", "older body", 3).unwrap();

        assert!(!applied);
        assert!(index.query("older").is_empty());
        assert_eq!(index.query("newer").len(), 1);
    }

    #[test]
    fn test_ranking_and_tie_order() {
        let (_dir, index) = setup();
        // "dense" is the whole body of A, a small part of B's.
        index.update("Alpha", "dense", 1).unwrap();
        index.update("Beta", "dense among many other unrelated words here", 2).unwrap();

        let hits = index.query("dense");
        assert_eq!(hits[0].title, "Alpha");
        assert_eq!(hits[1].title, "Beta");
        assert!(hits[0].score > hits[1].score);

        // Identical bodies tie; titles break the tie lexically.
        index.update("Zed", "twin content", 3).unwrap();
        index.update("Ann", "twin content", 4).unwrap();
        let hits = index.query("twin");
        assert_eq!(hits[0].title, "Ann");
        assert_eq!(hits[1].title, "Zed");
    }

    #[test]
    fn test_remove() {
        let (_dir, index) = setup();
        index.update("Page", "findable words", 1).unwrap();
        index.remove("Page").unwrap();

        assert!(index.query("findable").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idx");

        let index = SearchIndex::open(&path).unwrap();
        index.update("FrontPage", "durable terms", 9).unwrap();
        drop(index);

        let index = SearchIndex::open(&path).unwrap();
        assert_eq!(index.last_seq(), 9);
        let hits = index.query("durable");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "FrontPage");
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let (_dir, index) = setup();
        index.update("Page", "words", 4).unwrap();
        index.clear().unwrap();

        assert!(index.is_empty());
        assert_eq!(index.last_seq(), 4);
    }

    #[test]
    fn test_hit_json_shape() {
        let (_dir, index) = setup();
        index.update("FrontPage", "hello hello hello", 1).unwrap();

        let hits = index.query("hello");
        let json = serde_json::to_value(&hits).unwrap();
        assert_eq!(json[0]["title"], "FrontPage");
        assert!(json[0]["score"].is_number());
    }
}
