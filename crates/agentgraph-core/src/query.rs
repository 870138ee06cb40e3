//! Marker-delimited query extraction.
//!
//! A knowledgeable expert names entities to look up by wrapping each one in a
//! marker character, e.g. `"see @Treaty of Verdun@ and @Charlemagne@"`.
//! Extraction yields every maximal substring strictly between a matched pair
//! of markers, left to right, non-overlapping. A pair never spans a line
//! break, and a trailing unmatched marker is ignored.

use regex::Regex;

/// Marker used by the built-in prompt sets.
pub const DEFAULT_MARKER: char = '@';

/// Extracts marker-delimited queries from free text.
#[derive(Debug, Clone)]
pub struct QueryExtractor {
    marker: char,
    pattern: Regex,
}

impl QueryExtractor {
    pub fn new(marker: char) -> Self {
        let m = regex::escape(&marker.to_string());
        let pattern = Regex::new(&format!("{m}(.*?){m}"))
            .unwrap_or_else(|e| unreachable!("escaped marker pattern is valid: {e}"));
        Self { marker, pattern }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    /// All queries in order of appearance. Empty pairs yield `""`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Like [`extract`](Self::extract), minus blank queries, trimmed.
    pub fn extract_searchable(&self, text: &str) -> Vec<String> {
        self.extract(text)
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()
    }
}

impl Default for QueryExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        QueryExtractor::default().extract(text)
    }

    #[test]
    fn test_extracts_queries_left_to_right() {
        assert_eq!(extract("find @q1@ then @q2@"), vec!["q1", "q2"]);
    }

    #[test]
    fn test_no_markers_yields_no_queries() {
        assert!(extract("nothing to search here").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_odd_marker_count_ignores_trailing_marker() {
        assert_eq!(extract("@a@ and @b@ and @c"), vec!["a", "b"]);
        assert!(extract("only @one marker").is_empty());
    }

    #[test]
    fn test_empty_pair_yields_empty_query() {
        assert_eq!(extract("@@"), vec![""]);
        assert_eq!(extract("x @@ y @z@"), vec!["", "z"]);
    }

    #[test]
    fn test_adjacent_pairs_do_not_overlap() {
        // "@a@@b@" is two pairs, not "a", "", "b".
        assert_eq!(extract("@a@@b@"), vec!["a", "b"]);
    }

    #[test]
    fn test_newline_breaks_a_pair() {
        assert!(extract("@New\nYork@").is_empty());
        // A stray marker on one line does not swallow the next line's query.
        assert_eq!(extract("mail @a\nfoo @b@"), vec!["b"]);
    }

    #[test]
    fn test_custom_marker_is_escaped() {
        let extractor = QueryExtractor::new('+');
        assert_eq!(extractor.extract("+catfish effect+ @ignored@"), vec!["catfish effect"]);
        assert_eq!(extractor.marker(), '+');
    }

    #[test]
    fn test_searchable_drops_blank_queries_and_trims() {
        let extractor = QueryExtractor::default();
        assert_eq!(
            extractor.extract_searchable("@ Paris @ @  @ @@ @Lyon@"),
            vec!["Paris", "Lyon"]
        );
    }
}
