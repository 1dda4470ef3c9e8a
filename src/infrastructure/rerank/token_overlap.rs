use ahash::AHashSet;

use crate::{
    application::services::{text::tokenize, RerankEngine},
    domain::DomainError,
};

/// Offline reranker scoring a passage by how many distinct query terms it contains.
///
/// Scores lie in `[0, 1]`; a passage equal to the query (ignoring case and
/// surrounding whitespace) scores exactly 1.
#[derive(Debug, Default, Clone)]
pub struct TokenOverlapReranker;

impl TokenOverlapReranker {
    pub fn new() -> Self {
        Self
    }

    fn score_pair(query: &str, passage: &str) -> f32 {
        if query.trim().to_lowercase() == passage.trim().to_lowercase() {
            return 1.0;
        }

        let query_terms: AHashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() {
            return 0.0;
        }
        let passage_terms: AHashSet<String> = tokenize(passage).into_iter().collect();
        let shared = query_terms
            .iter()
            .filter(|term| passage_terms.contains(*term))
            .count();
        shared as f32 / query_terms.len() as f32
    }
}

impl RerankEngine for TokenOverlapReranker {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, DomainError> {
        Ok(pairs
            .iter()
            .map(|(query, passage)| Self::score_pair(query, passage))
            .collect())
    }

    fn id(&self) -> &str {
        "token-overlap"
    }
}
