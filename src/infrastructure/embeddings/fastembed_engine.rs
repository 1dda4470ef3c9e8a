use std::str::FromStr;

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;

use super::l2_normalize;
use crate::{application::services::EmbeddingEngine, domain::DomainError};

pub const DEFAULT_FASTEMBED_MODEL: &str = "Qdrant/all-MiniLM-L6-v2-onnx";

/// Sentence-transformer embeddings for queries and passages.
///
/// Must be the same model the domain indexes were built with, otherwise dense
/// search is skipped at startup.
pub struct FastEmbedEngine {
    model_code: String,
    dimensions: usize,
    session: Mutex<TextEmbedding>,
}

impl FastEmbedEngine {
    /// Downloads (or reuses the cached) ONNX weights for `model_code`.
    pub fn try_new(model_code: impl AsRef<str>) -> Result<Self, DomainError> {
        let (model, code) = resolve_model(model_code.as_ref())?;
        let dimensions = TextEmbedding::get_model_info(&model)
            .map(|info| info.dim)
            .map_err(|err| DomainError::embedding(format!("no metadata for `{code}`: {err}")))?;
        let session = TextEmbedding::try_new(TextInitOptions::new(model))
            .map_err(|err| DomainError::embedding(format!("cannot load `{code}`: {err}")))?;

        Ok(Self {
            model_code: code,
            dimensions,
            session: Mutex::new(session),
        })
    }
}

fn resolve_model(code: &str) -> Result<(EmbeddingModel, String), DomainError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(DomainError::validation("embedding model code is empty"));
    }
    EmbeddingModel::from_str(code)
        .map(|model| (model, code.to_string()))
        .map_err(|err| DomainError::embedding(format!("unknown embedding model `{code}`: {err}")))
}

impl EmbeddingEngine for FastEmbedEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("cannot embed blank text"));
        }

        let mut vector = self
            .session
            .lock()
            .embed(vec![text], None)
            .map_err(|err| DomainError::embedding(format!("{}: {err}", self.model_code)))?
            .pop()
            .ok_or_else(|| DomainError::embedding(format!("{}: empty batch", self.model_code)))?;

        if vector.len() != self.dimensions {
            return Err(DomainError::embedding(format!(
                "{} produced {} dims, expected {}",
                self.model_code,
                vector.len(),
                self.dimensions
            )));
        }
        // Inner-product search assumes unit vectors.
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn model(&self) -> &str {
        &self.model_code
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
