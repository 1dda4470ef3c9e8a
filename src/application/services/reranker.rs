use std::sync::Arc;

use tracing::{debug, warn};

use crate::{application::services::RerankEngine, domain::Candidate};

/// Second ranking pass scoring each candidate pairwise against the query.
pub struct Reranker {
    engine: Arc<dyn RerankEngine>,
    final_top_k: usize,
}

impl Reranker {
    pub fn new(engine: Arc<dyn RerankEngine>, final_top_k: usize) -> Self {
        Self {
            engine,
            final_top_k,
        }
    }

    /// Attaches a rerank score to every candidate and keeps the best `final_top_k`.
    ///
    /// When the engine fails, the fused score (clamped to `[0, 1]`) stands in
    /// for the rerank score so the fused order is preserved.
    pub fn rerank(&self, query: &str, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text().into_owned()).collect();
        let pairs: Vec<(&str, &str)> = texts.iter().map(|t| (query, t.as_str())).collect();

        match self.engine.score(&pairs) {
            Ok(scores) if scores.len() == candidates.len() => {
                for (candidate, score) in candidates.iter_mut().zip(scores) {
                    candidate.rerank_score = Some(score);
                }
            }
            Ok(scores) => {
                warn!(
                    target: "medirag::rerank",
                    engine = self.engine.id(),
                    expected = candidates.len(),
                    got = scores.len(),
                    "reranker returned a mismatched score count, keeping fused order"
                );
                keep_fused_scores(&mut candidates);
            }
            Err(err) => {
                warn!(
                    target: "medirag::rerank",
                    engine = self.engine.id(),
                    "reranking failed, keeping fused order: {err}"
                );
                keep_fused_scores(&mut candidates);
            }
        }

        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));
        candidates.truncate(self.final_top_k);
        debug!(target: "medirag::rerank", kept = candidates.len(), "reranking finished");
        candidates
    }
}

fn keep_fused_scores(candidates: &mut [Candidate]) {
    for candidate in candidates {
        candidate.rerank_score = Some(candidate.fused_score.clamp(0.0, 1.0));
    }
}
