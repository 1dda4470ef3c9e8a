use fastembed::{RerankInitOptions, TextRerank};
use parking_lot::Mutex;

use crate::{application::services::RerankEngine, domain::DomainError};

pub const DEFAULT_RERANK_MODEL: &str = "BAAI/bge-reranker-base";

/// Cross-encoder reranker backed by `fastembed`'s `TextRerank`.
///
/// Raw logits are mapped through a sigmoid so scores land in `[0, 1]`.
pub struct FastEmbedReranker {
    model_label: String,
    inner: Mutex<TextRerank>,
}

impl FastEmbedReranker {
    pub fn try_new(model_name: impl AsRef<str>) -> Result<Self, DomainError> {
        let label = model_name.as_ref().trim();
        let model = TextRerank::list_supported_models()
            .into_iter()
            .find(|info| info.model_code.eq_ignore_ascii_case(label))
            .map(|info| info.model)
            .ok_or_else(|| {
                DomainError::validation(format!("unsupported fastembed reranker `{label}`"))
            })?;

        let reranker = TextRerank::try_new(RerankInitOptions::new(model)).map_err(|err| {
            DomainError::rerank(format!(
                "failed to initialise fastembed reranker `{label}`: {err}"
            ))
        })?;

        Ok(Self {
            model_label: label.to_string(),
            inner: Mutex::new(reranker),
        })
    }
}

impl RerankEngine for FastEmbedReranker {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, DomainError> {
        let Some((query, _)) = pairs.first() else {
            return Ok(Vec::new());
        };
        if pairs.iter().any(|(q, _)| q != query) {
            return Err(DomainError::rerank(
                "cross-encoder batches must share one query",
            ));
        }

        let documents: Vec<&str> = pairs.iter().map(|(_, passage)| *passage).collect();
        let mut model = self.inner.lock();
        let results = model
            .rerank(*query, documents, false, None)
            .map_err(|err| DomainError::rerank(format!("fastembed rerank failed: {err}")))?;

        // Results come back sorted by score; restore input order.
        let mut scores = vec![0.0f32; pairs.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = sigmoid(result.score);
            }
        }
        Ok(scores)
    }

    fn id(&self) -> &str {
        &self.model_label
    }
}

fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}
