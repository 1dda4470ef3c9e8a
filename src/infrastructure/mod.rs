//! Infrastructure layer wiring concrete adapters (embeddings, indexes, models).

pub mod embeddings;
pub mod generation;
pub mod http_client;
pub mod index;
pub mod rerank;

#[cfg(feature = "fastembed-engine")]
pub use embeddings::{FastEmbedEngine, DEFAULT_FASTEMBED_MODEL};
pub use embeddings::SimpleEmbedEngine;
pub use generation::NoOpGenerator;
pub use http_client::RemoteGenerator;
pub use index::{build_dense_index, load_domain, load_domain_store, Bm25Index, FlatIpIndex};
#[cfg(feature = "fastembed-engine")]
pub use rerank::{FastEmbedReranker, DEFAULT_RERANK_MODEL};
pub use rerank::TokenOverlapReranker;
