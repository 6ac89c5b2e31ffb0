//! Shared positional inverted index.
//!
//! Layout: term -> document id -> zone -> positions, plus a global
//! term -> occurrence count map. Both live behind one mutex and are only
//! mutated through [`InvertedIndex::merge_token`], [`InvertedIndex::merge_document`]
//! and [`InvertedIndex::reset`].

use crate::document::{DocId, TfVector};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Named region of a document that postings are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Zone {
    Body,
}

/// zone -> positions, in scan order
pub type ZonePostings = BTreeMap<Zone, Vec<usize>>;

/// A consistent copy of both mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub inverted_file: HashMap<String, HashMap<DocId, ZonePostings>>,
    pub term_frequencies: HashMap<String, u64>,
}

impl IndexSnapshot {
    /// Sum of the position-list lengths recorded for `term` over all documents and zones.
    pub fn posting_count(&self, term: &str) -> u64 {
        self.inverted_file.get(term).map_or(0, |docs| {
            docs.values()
                .flat_map(|zones| zones.values())
                .map(|positions| positions.len() as u64)
                .sum()
        })
    }

    /// Terms whose posting count disagrees with their global frequency.
    pub fn inconsistent_terms(&self) -> Vec<String> {
        let mut bad: Vec<String> = self
            .term_frequencies
            .iter()
            .filter(|(term, freq)| self.posting_count(term) != **freq)
            .map(|(term, _)| term.clone())
            .collect();
        bad.extend(
            self.inverted_file
                .keys()
                .filter(|term| !self.term_frequencies.contains_key(*term))
                .cloned(),
        );
        bad
    }
}

#[derive(Default)]
pub struct InvertedIndex {
    inner: Mutex<IndexSnapshot>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Record one admitted occurrence of `term` at `position`.
    ///
    /// The global frequency, the posting append and the tf update happen in a
    /// single critical section. An occurrence that does not extend the
    /// document's position list (e.g. the same id indexed twice) is skipped
    /// without touching either mapping, and `false` is returned.
    pub fn merge_token(&self, doc_id: &str, zone: Zone, term: &str, position: usize, tf: &mut TfVector) -> bool {
        let mut inner = self.inner.lock();

        let last = inner
            .inverted_file
            .get(term)
            .and_then(|docs| docs.get(doc_id))
            .and_then(|zones| zones.get(&zone))
            .and_then(|positions| positions.last().copied());
        if last.is_some_and(|last| last >= position) {
            tracing::warn!(doc_id, term, position, ?last, "out-of-order position, skipping occurrence");
            return false;
        }
        tracing::trace!(doc_id, term, position, "updating postings");

        *inner.term_frequencies.entry(term.to_string()).or_insert(0) += 1;
        inner
            .inverted_file
            .entry(term.to_string())
            .or_default()
            .entry(doc_id.to_string())
            .or_default()
            .entry(zone)
            .or_default()
            .push(position);

        *tf.entry(term.to_string()).or_insert(0) += 1;
        true
    }

    /// Merge a document's admitted tokens, taking the lock once per token.
    /// Returns the document's term-frequency vector, counting only merged occurrences.
    pub fn merge_document(&self, doc_id: &str, zone: Zone, tokens: &[(String, usize)]) -> TfVector {
        let mut tf = TfVector::new();
        for (term, position) in tokens {
            self.merge_token(doc_id, zone, term, *position, &mut tf);
        }
        tf
    }

    /// Discard every entry in both mappings at once.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.inverted_file.clear();
        inner.term_frequencies.clear();
    }

    pub fn term_frequency(&self, term: &str) -> u64 {
        self.inner.lock().term_frequencies.get(term).copied().unwrap_or(0)
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.inner.lock().inverted_file.get(term).map_or(0, |docs| docs.len())
    }

    pub fn postings(&self, term: &str, doc_id: &str, zone: Zone) -> Option<Vec<usize>> {
        let inner = self.inner.lock();
        inner.inverted_file.get(term)?.get(doc_id)?.get(&zone).cloned()
    }

    /// All documents containing `term`, with their zone postings.
    pub fn documents(&self, term: &str) -> Option<HashMap<DocId, ZonePostings>> {
        self.inner.lock().inverted_file.get(term).cloned()
    }

    pub fn num_terms(&self) -> usize {
        self.inner.lock().term_frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.inverted_file.is_empty() && inner.term_frequencies.is_empty()
    }

    /// The `k` most frequent terms, ties broken alphabetically.
    pub fn top_terms(&self, k: usize) -> Vec<(String, u64)> {
        let mut terms: Vec<(String, u64)> = {
            let inner = self.inner.lock();
            inner.term_frequencies.iter().map(|(t, &f)| (t.clone(), f)).collect()
        };
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(k);
        terms
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(pairs: &[(&str, usize)]) -> Vec<(String, usize)> {
        pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
    }

    #[test]
    fn merge_builds_postings_and_frequencies() {
        let idx = InvertedIndex::new();
        let tf = idx.merge_document("d1", Zone::Body, &toks(&[("cat", 1), ("sat", 2), ("cat", 4)]));
        assert_eq!(tf.get("cat"), Some(&2));
        assert_eq!(tf.get("sat"), Some(&1));
        assert_eq!(idx.postings("cat", "d1", Zone::Body), Some(vec![1, 4]));
        assert_eq!(idx.term_frequency("cat"), 2);
        assert_eq!(idx.document_frequency("cat"), 1);
        assert_eq!(idx.num_terms(), 2);
    }

    #[test]
    fn frequencies_span_documents() {
        let idx = InvertedIndex::new();
        idx.merge_document("d1", Zone::Body, &toks(&[("sat", 2)]));
        idx.merge_document("d2", Zone::Body, &toks(&[("sat", 2), ("dog", 1)]));
        assert_eq!(idx.term_frequency("sat"), 2);
        assert_eq!(idx.document_frequency("sat"), 2);
        let docs = idx.documents("sat").unwrap();
        assert_eq!(docs["d1"][&Zone::Body], vec![2]);
        assert_eq!(docs["d2"][&Zone::Body], vec![2]);
        assert!(idx.snapshot().inconsistent_terms().is_empty());
    }

    #[test]
    fn repeated_document_id_stays_consistent() {
        let idx = InvertedIndex::new();
        let body = toks(&[("cat", 0), ("sat", 1), ("mat", 2)]);
        idx.merge_document("same", Zone::Body, &body);
        let tf = idx.merge_document("same", Zone::Body, &body);
        assert!(tf.is_empty());
        assert_eq!(idx.term_frequency("cat"), 1);
        assert_eq!(idx.postings("cat", "same", Zone::Body), Some(vec![0]));
        assert!(idx.snapshot().inconsistent_terms().is_empty());

        let mut tf = TfVector::new();
        assert!(idx.merge_token("same", Zone::Body, "cat", 7, &mut tf));
        assert!(!idx.merge_token("same", Zone::Body, "cat", 7, &mut tf));
        assert_eq!(tf.get("cat"), Some(&1));
        assert_eq!(idx.term_frequency("cat"), 2);
    }

    #[test]
    fn reset_empties_both_maps() {
        let idx = InvertedIndex::new();
        idx.merge_document("d1", Zone::Body, &toks(&[("cat", 0)]));
        assert!(!idx.is_empty());
        idx.reset();
        assert!(idx.is_empty());
        assert_eq!(idx.term_frequency("cat"), 0);
        assert_eq!(idx.postings("cat", "d1", Zone::Body), None);
    }

    #[test]
    fn top_terms_orders_by_frequency() {
        let idx = InvertedIndex::new();
        idx.merge_document("d1", Zone::Body, &toks(&[("b", 0), ("a", 1), ("c", 2), ("c", 3)]));
        let top = idx.top_terms(2);
        assert_eq!(top, vec![("c".to_string(), 2), ("a".to_string(), 1)]);
    }

    #[test]
    fn snapshot_serializes_zone_names() {
        let idx = InvertedIndex::new();
        idx.merge_document("d1", Zone::Body, &toks(&[("cat", 3)]));
        let json = serde_json::to_value(idx.snapshot()).unwrap();
        assert_eq!(json["inverted_file"]["cat"]["d1"]["body"][0], 3);
        assert_eq!(json["term_frequencies"]["cat"], 1);
    }
}
