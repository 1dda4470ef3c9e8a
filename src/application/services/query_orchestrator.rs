use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::services::{
        AnswerSynthesizer, DomainIndexStore, DomainRouter, EmbeddingEngine, HybridRetriever,
        PipelineConfig, RerankEngine, Reranker, TextGenerator,
    },
    domain::{
        models::round_secs, Candidate, DomainCatalog, DomainError, QueryResult, SourceExcerpt,
    },
};

/// Phrases that flag a question as a possible medical emergency.
pub const EMERGENCY_KEYWORDS: [&str; 14] = [
    "stiff neck",
    "purple spots",
    "meningitis",
    "chest pain",
    "difficulty breathing",
    "severe bleeding",
    "unconscious",
    "stroke",
    "slurred speech",
    "facial droop",
    "severe headache",
    "anaphylaxis",
    "swelling throat",
    "emergency",
];

/// Confidence reported when no candidate survived reranking.
const EMPTY_CONFIDENCE: f32 = 0.5;

/// Runs a question through routing, retrieval, reranking and synthesis.
pub struct QueryOrchestrator {
    router: DomainRouter,
    retriever: HybridRetriever,
    reranker: Reranker,
    synthesizer: AnswerSynthesizer,
    catalog: Arc<DomainCatalog>,
    store: Arc<DomainIndexStore>,
    config: PipelineConfig,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingEngine>,
        store: Arc<DomainIndexStore>,
        catalog: Arc<DomainCatalog>,
        rerank_engine: Arc<dyn RerankEngine>,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Result<Self, DomainError> {
        let retriever = HybridRetriever::new(
            embedder,
            Arc::clone(&store),
            Arc::clone(&catalog),
            config.clone(),
        )?;

        Ok(Self {
            router: DomainRouter::medical(),
            retriever,
            reranker: Reranker::new(rerank_engine, config.final_top_k),
            synthesizer: AnswerSynthesizer::new(generator, config.clone()),
            catalog,
            store,
            config,
        })
    }

    pub fn with_router(mut self, router: DomainRouter) -> Self {
        self.router = router;
        self
    }

    pub fn catalog(&self) -> &DomainCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &DomainIndexStore {
        &self.store
    }

    /// Answers `query`. Never fails: internal errors and panics become a
    /// degraded result with zero confidence.
    pub fn run_query(&self, query: &str) -> QueryResult {
        let started = Instant::now();

        let failure = match catch_unwind(AssertUnwindSafe(|| self.try_run(query, started))) {
            Ok(Ok(result)) => return result,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        error!(target: "medirag::query", "query pipeline failed: {failure}");
        QueryResult::degraded(
            query,
            format!("An internal error occurred while processing your question: {failure}"),
            started.elapsed().as_secs_f64(),
        )
    }

    fn try_run(&self, query: &str, started: Instant) -> Result<QueryResult, DomainError> {
        let is_emergency = detect_emergency(query);
        let domains = self.router.route(query);

        let candidates = self.retriever.retrieve(query, &domains)?;
        let ranked = self.reranker.rerank(query, candidates);
        let confidence = mean_confidence(&ranked);

        let answer = self
            .synthesizer
            .synthesize(query, &ranked, is_emergency, confidence);

        let sources = ranked
            .iter()
            .take(self.config.max_sources)
            .map(|c| SourceExcerpt::from_candidate(c, self.config.source_excerpt_chars))
            .collect();

        let processing_time = round_secs(started.elapsed().as_secs_f64());
        info!(
            target: "medirag::query",
            domains = ?domains,
            candidates = ranked.len(),
            confidence,
            is_emergency,
            answer_kind = ?answer.kind,
            processing_time,
            "query answered"
        );

        Ok(QueryResult {
            id: Uuid::new_v4(),
            query: query.to_string(),
            answer: answer.text,
            domains,
            confidence,
            processing_time,
            is_emergency,
            sources,
            answered_at: Utc::now(),
        })
    }
}

/// Case-insensitive substring match against [`EMERGENCY_KEYWORDS`].
pub fn detect_emergency(query: &str) -> bool {
    let query = query.to_lowercase();
    EMERGENCY_KEYWORDS.iter().any(|k| query.contains(k))
}

/// Mean final score of the ranked candidates, clamped to `[0, 1]`.
pub fn mean_confidence(ranked: &[Candidate]) -> f32 {
    if ranked.is_empty() {
        return EMPTY_CONFIDENCE;
    }
    let total: f32 = ranked.iter().map(Candidate::score).sum();
    (total / ranked.len() as f32).clamp(0.0, 1.0)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "pipeline panicked".to_string()
    }
}
