use thiserror::Error;

/// Domain-level errors shared across the retrieval pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested domain is not part of the catalog.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// The domain is known but its indexes were never loaded.
    #[error("domain not loaded: {0}")]
    NotLoaded(String),

    /// A required on-disk artifact does not exist.
    #[error("artifact missing: {0}")]
    ArtifactMissing(String),

    /// An artifact exists but could not be decoded or violates alignment.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    /// The incoming payload missed a required field or violated invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// Embedding backend failure or vector incompatibility.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// Dense or lexical index search failure.
    #[error("index failure: {0}")]
    Index(String),

    /// Reranking backend failure.
    #[error("rerank failure: {0}")]
    Rerank(String),

    /// Text generation backend failure.
    #[error("generation failure: {0}")]
    Generation(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn unknown_domain(name: impl Into<String>) -> Self {
        Self::UnknownDomain(name.into())
    }

    pub fn not_loaded(name: impl Into<String>) -> Self {
        Self::NotLoaded(name.into())
    }

    pub fn artifact_missing(path: impl Into<String>) -> Self {
        Self::ArtifactMissing(path.into())
    }

    pub fn invalid_artifact(msg: impl Into<String>) -> Self {
        Self::InvalidArtifact(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    pub fn rerank(msg: impl Into<String>) -> Self {
        Self::Rerank(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
