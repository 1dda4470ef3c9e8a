//! Contracts for the model and index collaborators the pipeline consumes.

use crate::domain::DomainError;

/// Abstraction over any embedding engine (hashed, FastEmbed, remote, ...).
///
/// Vectors must be L2-normalised and identical for identical input.
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    fn model(&self) -> &str;

    fn dims(&self) -> Option<usize> {
        None
    }
}

/// Nearest-neighbour search over one domain's passage embeddings.
pub trait DenseIndex: Send + Sync {
    /// Up to `k` `(row, similarity)` pairs ranked by descending similarity.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, DomainError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dims(&self) -> usize;
}

/// Term-weighted ranking over one domain's tokenised passages.
pub trait LexicalIndex: Send + Sync {
    /// One score per passage row, in row order.
    fn score_all(&self, query_tokens: &[String]) -> Vec<f32>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pairwise relevance model used for the final ranking pass.
pub trait RerankEngine: Send + Sync {
    /// One score per `(query, passage)` pair, in input order.
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, DomainError>;

    fn id(&self) -> &str;
}

/// Decoding parameters handed to the text generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub num_beams: usize,
    pub do_sample: bool,
    pub repetition_penalty: f32,
    /// Prompt tokens beyond this are truncated by the backend.
    pub max_input_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            num_beams: 4,
            do_sample: false,
            repetition_penalty: 1.15,
            max_input_tokens: 1024,
        }
    }
}

/// Sequence-to-sequence text generator.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, DomainError>;

    fn id(&self) -> &str;
}
