use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TERMS: usize = 5000;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 50;
pub const DEFAULT_TOP_K: usize = 5;

/// Limits applied while building and querying an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vocabulary cap; the most frequent terms across the corpus are kept.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
    /// How many candidates the inverted index hands to re-ranking.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_terms() -> usize { DEFAULT_MAX_TERMS }
fn default_candidate_limit() -> usize { DEFAULT_CANDIDATE_LIMIT }
fn default_top_k() -> usize { DEFAULT_TOP_K }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_terms: DEFAULT_MAX_TERMS,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"max_terms": 10}"#).unwrap();
        assert_eq!(cfg.max_terms, 10);
        assert_eq!(cfg.candidate_limit, DEFAULT_CANDIDATE_LIMIT);
        assert_eq!(cfg.top_k, DEFAULT_TOP_K);
    }
}
