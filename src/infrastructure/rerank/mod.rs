mod token_overlap;

#[cfg(feature = "fastembed-engine")]
mod fastembed_reranker;

#[cfg(feature = "fastembed-engine")]
pub use fastembed_reranker::{FastEmbedReranker, DEFAULT_RERANK_MODEL};
pub use token_overlap::TokenOverlapReranker;
