use crate::document::DocumentStore;
use crate::tokenizer::terms;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
}

/// Document attributes kept alongside the postings so a hit can be rendered
/// without going back to the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFields {
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub body: String,
    pub normalized: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>, // postings sorted by doc_id
    docs: Vec<StoredFields>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Index every document's normalized field. Always starts from scratch.
    pub fn build(store: &DocumentStore) -> Self {
        let mut index = Self::new();
        for (doc_id, doc) in store.iter() {
            let mut tf_counts: HashMap<&str, u32> = HashMap::new();
            let mut order: Vec<&str> = Vec::new();
            for term in terms(&doc.normalized) {
                let count = tf_counts.entry(term).or_insert(0);
                if *count == 0 {
                    order.push(term);
                }
                *count += 1;
            }
            for term in order {
                index
                    .postings
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting { doc_id, term_freq: tf_counts[term] });
            }
            index.docs.push(StoredFields {
                external_id: doc.id.clone(),
                source: doc.source.clone(),
                title: doc.title.clone(),
                body: doc.body.clone(),
                normalized: doc.normalized.clone(),
            });
        }
        tracing::info!(num_docs = index.docs.len(), num_terms = index.postings.len(), "built inverted index");
        index
    }

    /// Disjunctive candidate lookup over already-normalized terms.
    ///
    /// A document is a candidate when it holds at least one of the terms.
    /// Candidates are ordered by the number of distinct query terms they
    /// contain, then by the summed term frequency of those terms, then by
    /// ascending [`DocId`], and truncated to `limit`.
    pub fn query<S: AsRef<str>>(&self, query_terms: &[S], limit: usize) -> Vec<DocId> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut scores: HashMap<DocId, (u32, u32)> = HashMap::new();
        for term in query_terms.iter().map(|t| t.as_ref()) {
            if !seen.insert(term) {
                continue;
            }
            for p in self.postings_for(term) {
                let entry = scores.entry(p.doc_id).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += p.term_freq;
            }
        }

        let mut ranked: Vec<(DocId, (u32, u32))> = scores.into_iter().collect();
        ranked.sort_by_key(|&(doc_id, (matched, tf))| (Reverse(matched), Reverse(tf), doc_id));
        ranked.truncate(limit);
        ranked.into_iter().map(|(doc_id, _)| doc_id).collect()
    }

    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_term(&self, term: &str) -> bool { self.postings.contains_key(term) }

    pub fn stored(&self, doc_id: DocId) -> Option<&StoredFields> { self.docs.get(doc_id as usize) }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{RawRecord, RecordBatch};

    fn store() -> DocumentStore {
        DocumentStore::load(vec![RecordBatch::new(
            "uji",
            vec![
                RawRecord::new("harga beras naik", "beras langka"),
                RawRecord::new("harga cabai turun", ""),
                RawRecord::new("cuaca cerah", "hujan reda"),
            ],
        )])
    }

    #[test]
    fn postings_hold_each_document_once() {
        let index = InvertedIndex::build(&store());
        assert_eq!(index.postings_for("beras"), &[Posting { doc_id: 0, term_freq: 2 }]);
        let harga: Vec<DocId> = index.postings_for("harga").iter().map(|p| p.doc_id).collect();
        assert_eq!(harga, vec![0, 1]);
        assert_eq!(index.stored(2).unwrap().external_id, "uji_2");
    }

    #[test]
    fn query_is_disjunctive_and_ranked() {
        let index = InvertedIndex::build(&store());
        assert_eq!(index.query(&["harga", "beras"], 50), vec![0, 1]);
        assert_eq!(index.query(&["cabai", "hujan"], 50), vec![1, 2]);
        assert_eq!(index.query(&["harga"], 1), vec![0]);
    }

    #[test]
    fn empty_and_unknown_terms_yield_nothing() {
        let index = InvertedIndex::build(&store());
        let none: [&str; 0] = [];
        assert!(index.query(&none, 50).is_empty());
        assert!(index.query(&["gempa"], 50).is_empty());
    }

    #[test]
    fn repeated_query_terms_count_once() {
        let index = InvertedIndex::build(&store());
        assert_eq!(index.query(&["cabai", "cabai", "beras"], 50), vec![0, 1]);
    }
}
