pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod loader;
pub mod persist;
pub mod search;
pub mod tokenizer;
pub mod vector;

pub use config::EngineConfig;
pub use document::{Document, DocumentStore, RawRecord, RecordBatch};
pub use error::SearchError;
pub use index::{InvertedIndex, Posting, StoredFields};
pub use search::{IndexedCorpus, QueryStatus, SearchEngine, SearchReport, SearchResult, TermDiagnostic};
pub use vector::{cosine_similarity, TermVector, VectorSpaceModel, Vocabulary};

/// Dense ordinal of a document in the store, assigned in load order.
pub type DocId = u32;
/// Position of a term in the fitted vocabulary.
pub type Slot = u32;
