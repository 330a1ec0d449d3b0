use thiserror::Error;

/// Structural failures surfaced by the indexing and search pipeline.
///
/// An empty query is not represented here: it is a valid input that yields
/// no results, see [`crate::QueryStatus::EmptyQuery`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("no documents survived loading; nothing to index")]
    EmptyCorpus,
    #[error("search requested before any index was built")]
    NotIndexed,
    #[error("failed to read record batch `{source_name}`: {message}")]
    RecordBatch { source_name: String, message: String },
}
