//! Tokenization for the search index.
//!
//! Terms are maximal alphanumeric runs, lowercased. The same function runs
//! over page bodies, titles and queries, so a term matches itself no matter
//! where it came from.

use std::collections::BTreeMap;

/// Split text into lowercase terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Count term occurrences in text.
pub fn term_frequencies(text: &str) -> BTreeMap<String, u32> {
    let mut frequencies = BTreeMap::new();
    for term in tokenize(text) {
        *frequencies.entry(term).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Hello CamelCase World"),
            vec!["hello", "camelcase", "world"]
        );
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("# Heading, with *markup* and [links](./Page)!"),
            vec!["heading", "with", "markup", "and", "links", "page"]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("--- *** ---").is_empty());
    }

    #[test]
    fn test_term_frequencies() {
        let freq = term_frequencies("the cat and the hat");
        assert_eq!(freq.get("the"), Some(&2));
        assert_eq!(freq.get("cat"), Some(&1));
        assert_eq!(freq.len(), 4);
    }
}
