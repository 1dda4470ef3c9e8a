//! Service layer: the retrieval-augmented answering pipeline and the
//! collaborator contracts it is built on.

mod config;
mod engines;
mod index_store;
mod query_orchestrator;
mod reranker;
mod retriever;
mod router;
mod synthesizer;
pub mod text;

pub use config::PipelineConfig;
pub use engines::{
    DenseIndex, EmbeddingEngine, GenerationParams, LexicalIndex, RerankEngine, TextGenerator,
};
pub use index_store::{DomainIndex, DomainIndexStore};
pub use query_orchestrator::{
    detect_emergency, mean_confidence, QueryOrchestrator, EMERGENCY_KEYWORDS,
};
pub use reranker::Reranker;
pub use retriever::{fuse_scores, HybridRetriever};
pub use router::DomainRouter;
pub use synthesizer::{
    build_prompt, AnswerKind, AnswerSynthesizer, SynthesizedAnswer, EMERGENCY_MESSAGE,
    EMERGENCY_REMINDER, INSUFFICIENT_INFORMATION_MESSAGE, PROFESSIONAL_DISCLAIMER,
};
