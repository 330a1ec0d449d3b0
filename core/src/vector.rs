use crate::document::DocumentStore;
use crate::tokenizer::terms;
use crate::{DocId, Slot};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// Sparse raw term-frequency vector: `(slot, count)` pairs sorted by slot,
/// zero counts never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVector {
    entries: Vec<(Slot, u32)>,
}

impl TermVector {
    /// Collect counts, summing repeated slots and dropping zeros.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (Slot, u32)>,
    {
        let mut entries: Vec<(Slot, u32)> = counts.into_iter().filter(|&(_, c)| c > 0).collect();
        entries.sort_unstable_by_key(|&(slot, _)| slot);
        entries.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[(Slot, u32)] { &self.entries }

    pub fn count(&self, slot: Slot) -> u32 {
        self.entries
            .binary_search_by_key(&slot, |&(s, _)| s)
            .map(|i| self.entries[i].1)
            .unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 { self.entries.iter().map(|&(_, c)| c as u64).sum() }

    /// Number of slots with a non-zero count.
    pub fn nnz(&self) -> usize { self.entries.len() }

    pub fn is_zero(&self) -> bool { self.entries.is_empty() }

    fn squared_norm(&self) -> u64 {
        self.entries.iter().map(|&(_, c)| (c as u64) * (c as u64)).sum()
    }

    fn dot(&self, other: &TermVector) -> u64 {
        let (mut i, mut j, mut acc) = (0, 0, 0u64);
        while i < self.entries.len() && j < other.entries.len() {
            let (sa, ca) = self.entries[i];
            let (sb, cb) = other.entries[j];
            match sa.cmp(&sb) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    acc += (ca as u64) * (cb as u64);
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

/// Cosine similarity of two count vectors, in `[0, 1]`.
/// Zero when either side has no counts.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let na = a.squared_norm();
    let nb = b.squared_norm();
    if na == 0 || nb == 0 {
        return 0.0;
    }
    let sim = a.dot(b) as f64 / ((na as f64) * (nb as f64)).sqrt();
    sim.min(1.0)
}

/// Fixed table of retained terms. Slots are assigned in lexicographic term
/// order so a given term set always maps to the same slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    slots: HashMap<String, Slot>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let slots = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as Slot)).collect();
        Self { terms, slots }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self { vocab.terms }
}

impl Vocabulary {
    /// Keep the `max_terms` most frequent terms across the corpus. Equal
    /// totals are broken by the order terms were first seen.
    pub fn fit(store: &DocumentStore, max_terms: usize) -> Self {
        let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();
        for (_, doc) in store.iter() {
            for term in terms(&doc.normalized) {
                let next = totals.len();
                totals.entry(term).or_insert((0, next)).0 += 1;
            }
        }
        let observed = totals.len();
        let mut ranked: Vec<(&str, u64, usize)> = totals.into_iter().map(|(t, (n, first))| (t, n, first)).collect();
        ranked.sort_unstable_by_key(|&(_, n, first)| (Reverse(n), first));
        ranked.truncate(max_terms);

        let mut kept: Vec<String> = ranked.into_iter().map(|(t, _, _)| t.to_string()).collect();
        kept.sort_unstable();
        tracing::info!(observed, kept = kept.len(), max_terms, "fitted vocabulary");
        Self::from(kept)
    }

    pub fn slot(&self, term: &str) -> Option<Slot> { self.slots.get(term).copied() }

    pub fn term(&self, slot: Slot) -> Option<&str> { self.terms.get(slot as usize).map(String::as_str) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Count vocabulary terms in whitespace-separated normalized text;
    /// unknown terms are dropped.
    pub fn encode(&self, text: &str) -> TermVector {
        TermVector::from_counts(terms(text).filter_map(|t| self.slot(t)).map(|slot| (slot, 1)))
    }
}

/// Vocabulary plus the precomputed vector of every document, by [`DocId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorSpaceModel {
    vocabulary: Vocabulary,
    doc_vectors: Vec<TermVector>,
}

impl VectorSpaceModel {
    pub fn fit(store: &DocumentStore, max_terms: usize) -> Self {
        let vocabulary = Vocabulary::fit(store, max_terms);
        let doc_vectors = store.iter().map(|(_, doc)| vocabulary.encode(&doc.normalized)).collect();
        Self { vocabulary, doc_vectors }
    }

    pub fn from_parts(vocabulary: Vocabulary, doc_vectors: Vec<TermVector>) -> Self {
        Self { vocabulary, doc_vectors }
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn doc_vectors(&self) -> &[TermVector] { &self.doc_vectors }

    pub fn encode(&self, text: &str) -> TermVector { self.vocabulary.encode(text) }

    pub fn document_vector(&self, doc_id: DocId) -> Option<&TermVector> {
        self.doc_vectors.get(doc_id as usize)
    }
}
