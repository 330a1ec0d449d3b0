use crate::config::EngineConfig;
use crate::document::{DocumentStore, RecordBatch};
use crate::error::SearchError;
use crate::index::InvertedIndex;
use crate::tokenizer::{normalize, terms};
use crate::vector::{cosine_similarity, VectorSpaceModel};
use crate::{DocId, Slot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub source: String,
    pub title: String,
    pub body: String,
    pub score: f64,
}

/// How a query ended. Both non-matching outcomes carry an empty result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Nothing was left of the query after normalization.
    EmptyQuery,
    /// No document contains any query term.
    NoMatches,
    Matched,
}

/// A normalized query term and its vocabulary slot, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDiagnostic {
    pub term: String,
    pub slot: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub normalized: String,
    pub status: QueryStatus,
    pub terms: Vec<TermDiagnostic>,
    /// Sum of counts in the encoded query vector.
    pub query_vector_total: u64,
    /// Non-zero slots in the encoded query vector.
    pub query_vector_nnz: usize,
    /// Candidates returned by the inverted index before re-ranking.
    pub candidates: usize,
    pub results: Vec<SearchResult>,
}

impl SearchReport {
    fn empty(query: &str, normalized: String, status: QueryStatus) -> Self {
        Self {
            query: query.to_string(),
            normalized,
            status,
            terms: Vec::new(),
            query_vector_total: 0,
            query_vector_nnz: 0,
            candidates: 0,
            results: Vec::new(),
        }
    }
}

/// One fully built index generation: the corpus and everything derived
/// from it. Immutable once built.
#[derive(Debug)]
pub struct IndexedCorpus {
    config: EngineConfig,
    store: DocumentStore,
    index: InvertedIndex,
    model: VectorSpaceModel,
}

impl IndexedCorpus {
    pub fn build(config: EngineConfig, store: DocumentStore) -> Result<Self, SearchError> {
        if store.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }
        let index = InvertedIndex::build(&store);
        let model = VectorSpaceModel::fit(&store, config.max_terms);
        Ok(Self { config, store, index, model })
    }

    /// Reassemble a previously built generation, e.g. one read back from disk.
    pub fn from_parts(config: EngineConfig, store: DocumentStore, index: InvertedIndex, model: VectorSpaceModel) -> Self {
        Self { config, store, index, model }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn store(&self) -> &DocumentStore { &self.store }
    pub fn index(&self) -> &InvertedIndex { &self.index }
    pub fn model(&self) -> &VectorSpaceModel { &self.model }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        self.explain(query, top_k).results
    }

    /// Run the two-stage pipeline and report how the query was handled.
    ///
    /// Candidates come from the inverted index in its own order; re-ranking
    /// by cosine similarity is a stable sort, so equal scores keep that order.
    pub fn explain(&self, query: &str, top_k: usize) -> SearchReport {
        let normalized = normalize(query);
        if normalized.is_empty() {
            tracing::debug!(query, "query is empty after normalization");
            return SearchReport::empty(query, normalized, QueryStatus::EmptyQuery);
        }

        let query_terms: Vec<&str> = terms(&normalized).collect();
        let vocabulary = self.model.vocabulary();
        let diagnostics: Vec<TermDiagnostic> = query_terms
            .iter()
            .map(|t| TermDiagnostic { term: t.to_string(), slot: vocabulary.slot(t) })
            .collect();
        let query_vector = self.model.encode(&normalized);
        tracing::debug!(
            terms = ?query_terms,
            in_vocabulary = diagnostics.iter().filter(|d| d.slot.is_some()).count(),
            vector_total = query_vector.total(),
            vector_nnz = query_vector.nnz(),
            "encoded query"
        );

        let candidates = self.index.query(&query_terms, self.config.candidate_limit);
        let mut report = SearchReport {
            terms: diagnostics,
            query_vector_total: query_vector.total(),
            query_vector_nnz: query_vector.nnz(),
            candidates: candidates.len(),
            ..SearchReport::empty(query, normalized, QueryStatus::NoMatches)
        };
        if candidates.is_empty() {
            return report;
        }

        let mut scored: Vec<(DocId, f64)> = candidates
            .into_iter()
            .filter_map(|doc_id| {
                let doc_vector = self.model.document_vector(doc_id)?;
                Some((doc_id, cosine_similarity(&query_vector, doc_vector)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        report.results = scored
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let fields = self.index.stored(doc_id)?;
                Some(SearchResult {
                    id: fields.external_id.clone(),
                    source: fields.source.clone(),
                    title: fields.title.clone(),
                    body: fields.body.clone(),
                    score,
                })
            })
            .collect();
        report.status = QueryStatus::Matched;
        tracing::debug!(candidates = report.candidates, returned = report.results.len(), "ranked candidates");
        report
    }
}

#[derive(Debug, Default)]
enum EngineState {
    #[default]
    Uninitialized,
    Indexed(Arc<IndexedCorpus>),
}

/// Owns the current index generation and its lifecycle:
/// `Uninitialized -> Indexed`, rebuilt in place, back to `Uninitialized`
/// only through [`SearchEngine::reset`].
#[derive(Debug, Default)]
pub struct SearchEngine {
    config: EngineConfig,
    state: EngineState,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, state: EngineState::Uninitialized }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn is_indexed(&self) -> bool { matches!(self.state, EngineState::Indexed(_)) }

    /// Load the batches and build a new generation. The previous generation
    /// stays installed if the corpus turns out empty.
    pub fn build<I>(&mut self, batches: I) -> Result<Arc<IndexedCorpus>, SearchError>
    where
        I: IntoIterator<Item = RecordBatch>,
    {
        let store = DocumentStore::load(batches);
        let corpus = IndexedCorpus::build(self.config, store)?;
        Ok(self.install(corpus))
    }

    /// Swap in a fully built generation. Snapshots taken earlier keep
    /// pointing at the generation they were taken from.
    pub fn install(&mut self, corpus: IndexedCorpus) -> Arc<IndexedCorpus> {
        let corpus = Arc::new(corpus);
        tracing::info!(
            num_docs = corpus.store().len(),
            num_terms = corpus.index().num_terms(),
            vocabulary = corpus.model().vocabulary().len(),
            "installed index generation"
        );
        self.state = EngineState::Indexed(Arc::clone(&corpus));
        corpus
    }

    pub fn reset(&mut self) {
        self.state = EngineState::Uninitialized;
    }

    pub fn snapshot(&self) -> Result<Arc<IndexedCorpus>, SearchError> {
        match &self.state {
            EngineState::Indexed(corpus) => Ok(Arc::clone(corpus)),
            EngineState::Uninitialized => Err(SearchError::NotIndexed),
        }
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, SearchError> {
        Ok(self.snapshot()?.search(query, top_k))
    }

    pub fn explain(&self, query: &str, top_k: usize) -> Result<SearchReport, SearchError> {
        Ok(self.snapshot()?.explain(query, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawRecord;

    fn batch(records: Vec<RawRecord>) -> Vec<RecordBatch> {
        vec![RecordBatch::new("berita", records)]
    }

    #[test]
    fn search_before_build_is_not_indexed() {
        let engine = SearchEngine::default();
        assert_eq!(engine.search("apa saja", 5), Err(SearchError::NotIndexed));
    }

    #[test]
    fn empty_corpus_keeps_previous_generation() {
        let mut engine = SearchEngine::default();
        engine.build(batch(vec![RawRecord::new("banjir jakarta", "")])).unwrap();
        let err = engine.build(batch(vec![RawRecord::default()])).unwrap_err();
        assert_eq!(err, SearchError::EmptyCorpus);
        assert_eq!(engine.search("banjir", 5).unwrap().len(), 1);
    }

    #[test]
    fn rebuild_does_not_disturb_held_snapshot() {
        let mut engine = SearchEngine::default();
        engine.build(batch(vec![RawRecord::new("banjir jakarta", "")])).unwrap();
        let old = engine.snapshot().unwrap();
        engine.build(batch(vec![RawRecord::new("gempa bumi", "")])).unwrap();
        assert_eq!(old.search("banjir", 5).len(), 1);
        assert!(engine.search("banjir", 5).unwrap().is_empty());
        assert_eq!(engine.search("gempa", 5).unwrap().len(), 1);
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut engine = SearchEngine::default();
        engine.build(batch(vec![RawRecord::new("banjir jakarta", "")])).unwrap();
        assert!(engine.is_indexed());
        engine.reset();
        assert!(!engine.is_indexed());
        assert_eq!(engine.explain("banjir", 5), Err(SearchError::NotIndexed));
    }

    #[test]
    fn explain_reports_status_and_diagnostics() {
        let mut engine = SearchEngine::default();
        engine.build(batch(vec![RawRecord::new("harga beras naik", "")])).unwrap();

        let report = engine.explain("di", 5).unwrap();
        assert_eq!(report.status, QueryStatus::EmptyQuery);

        let report = engine.explain("harga emas", 5).unwrap();
        assert_eq!(report.status, QueryStatus::Matched);
        assert_eq!(report.terms.len(), 2);
        assert!(report.terms[0].slot.is_some());
        assert!(report.terms[1].slot.is_none());
        assert_eq!(report.query_vector_total, 1);
        assert_eq!(report.query_vector_nnz, 1);

        let report = engine.explain("emas", 5).unwrap();
        assert_eq!(report.status, QueryStatus::NoMatches);
        assert!(report.results.is_empty());
    }

    #[test]
    fn zero_top_k_returns_nothing() {
        let mut engine = SearchEngine::default();
        engine.build(batch(vec![RawRecord::new("harga beras naik", "")])).unwrap();
        assert!(engine.search("harga", 0).unwrap().is_empty());
    }
}
