use crate::application::services::GenerationParams;

/// Fixed tuning of the question-answering pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Nearest neighbours fetched from each domain's dense index.
    pub dense_top_k: usize,
    /// Highest BM25 rows per domain; these rows are the fusion candidates.
    pub lexical_top_k: usize,
    pub dense_weight: f32,
    pub lexical_weight: f32,
    /// Cap on merged candidates across all domains.
    pub max_candidates: usize,
    pub final_top_k: usize,
    pub max_context_chars: usize,
    pub max_context_chunks: usize,
    /// Cleaned chunks must be longer than this to enter the prompt context.
    pub min_chunk_chars: usize,
    pub emergency_threshold: f32,
    pub min_answer_words: usize,
    pub fallback_sentences: usize,
    pub retrieval_workers: usize,
    pub max_sources: usize,
    pub source_excerpt_chars: usize,
    pub generation: GenerationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dense_top_k: 30,
            lexical_top_k: 30,
            dense_weight: 0.6,
            lexical_weight: 0.4,
            max_candidates: 30,
            final_top_k: 5,
            max_context_chars: 3500,
            max_context_chunks: 8,
            min_chunk_chars: 60,
            emergency_threshold: 0.4,
            min_answer_words: 40,
            fallback_sentences: 10,
            retrieval_workers: 5,
            max_sources: 3,
            source_excerpt_chars: 200,
            generation: GenerationParams::default(),
        }
    }
}
