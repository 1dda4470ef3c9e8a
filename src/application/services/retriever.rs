use std::sync::Arc;

use ahash::AHashMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::{
    application::services::{
        text::tokenize, DomainIndex, DomainIndexStore, EmbeddingEngine, PipelineConfig,
    },
    domain::{Candidate, DomainCatalog, DomainError},
};

/// Fans a query out to the routed domains and fuses dense and lexical scores.
pub struct HybridRetriever {
    embedder: Arc<dyn EmbeddingEngine>,
    store: Arc<DomainIndexStore>,
    catalog: Arc<DomainCatalog>,
    config: PipelineConfig,
    pool: ThreadPool,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingEngine>,
        store: Arc<DomainIndexStore>,
        catalog: Arc<DomainCatalog>,
        config: PipelineConfig,
    ) -> Result<Self, DomainError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.retrieval_workers.max(1))
            .thread_name(|i| format!("medirag-retrieval-{i}"))
            .build()
            .map_err(|err| DomainError::other(format!("failed to build retrieval pool: {err}")))?;

        Ok(Self {
            embedder,
            store,
            catalog,
            config,
            pool,
        })
    }

    /// Candidates from every routed domain, best fused score first.
    ///
    /// Fails only when a routed domain is not in the catalog; unloaded
    /// domains and per-domain search failures contribute no candidates.
    pub fn retrieve(&self, query: &str, domains: &[String]) -> Result<Vec<Candidate>, DomainError> {
        for domain in domains {
            self.catalog.get(domain)?;
        }

        // Embedding is deterministic, so one vector serves every domain.
        let query_vector = match self.embedder.embed(query) {
            Ok(vector) => Some(vector),
            Err(err) => {
                warn!(target: "medirag::retrieval", "query embedding failed, lexical only: {err}");
                None
            }
        };
        let tokens = tokenize(query);

        // Each task fills its own buffer; buffers are merged after the join.
        let per_domain: Vec<Vec<Candidate>> = self.pool.install(|| {
            domains
                .par_iter()
                .map(|domain| self.search_domain(domain, query_vector.as_deref(), &tokens))
                .collect()
        });

        let mut merged: Vec<Candidate> = per_domain.into_iter().flatten().collect();
        merged.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));
        merged.truncate(self.config.max_candidates);

        debug!(
            target: "medirag::retrieval",
            candidates = merged.len(),
            "hybrid retrieval finished"
        );
        Ok(merged)
    }

    fn search_domain(
        &self,
        domain: &str,
        query_vector: Option<&[f32]>,
        tokens: &[String],
    ) -> Vec<Candidate> {
        let index = match self.store.get(domain) {
            Ok(index) => index,
            Err(err) => {
                debug!(target: "medirag::retrieval", domain, "{err}");
                return Vec::new();
            }
        };

        let dense_scores = self.dense_scores(domain, index, query_vector);
        let lexical_scores = index.lexical().score_all(tokens);

        fuse_scores(&dense_scores, &lexical_scores, &self.config)
            .into_iter()
            .filter_map(|(position, score)| {
                index
                    .document(position)
                    .map(|doc| Candidate::new(domain, position, doc.clone(), score))
            })
            .collect()
    }

    fn dense_scores(
        &self,
        domain: &str,
        index: &DomainIndex,
        query_vector: Option<&[f32]>,
    ) -> AHashMap<usize, f32> {
        let Some(vector) = query_vector else {
            return AHashMap::new();
        };
        match index.dense().search(vector, self.config.dense_top_k) {
            Ok(hits) => hits.into_iter().collect(),
            Err(err) => {
                warn!(target: "medirag::retrieval", domain, "dense search failed: {err}");
                AHashMap::new()
            }
        }
    }
}

/// Fused `(row, score)` pairs for the lexical top-k rows, in lexical rank order.
///
/// Only rows in the lexical top-k are emitted; a row outside the dense top-k
/// keeps a dense score of zero.
pub fn fuse_scores(
    dense: &AHashMap<usize, f32>,
    lexical: &[f32],
    config: &PipelineConfig,
) -> Vec<(usize, f32)> {
    let mut rows: Vec<usize> = (0..lexical.len()).collect();
    rows.sort_by(|a, b| lexical[*b].total_cmp(&lexical[*a]));
    rows.truncate(config.lexical_top_k);

    rows.into_iter()
        .map(|row| {
            let dense_score = dense.get(&row).copied().unwrap_or(0.0);
            let score = config.dense_weight * dense_score + config.lexical_weight * lexical[row];
            (row, score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{DenseIndex, LexicalIndex};
    use crate::domain::PassageContent;

    struct FixedDense(Vec<(usize, f32)>, usize);

    impl DenseIndex for FixedDense {
        fn search(&self, _query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, DomainError> {
            Ok(self.0.iter().copied().take(k).collect())
        }
        fn len(&self) -> usize {
            self.1
        }
        fn dims(&self) -> usize {
            2
        }
    }

    struct FixedLexical(Vec<f32>);

    impl LexicalIndex for FixedLexical {
        fn score_all(&self, _query_tokens: &[String]) -> Vec<f32> {
            self.0.clone()
        }
        fn len(&self) -> usize {
            self.0.len()
        }
    }

    struct UnitEmbedder;

    impl EmbeddingEngine for UnitEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
            Ok(vec![1.0, 0.0])
        }
        fn model(&self) -> &str {
            "unit"
        }
    }

    struct FailingEmbedder;

    impl EmbeddingEngine for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
            Err(DomainError::embedding("offline"))
        }
        fn model(&self) -> &str {
            "failing"
        }
    }

    fn domain_index(dense: Vec<(usize, f32)>, lexical: Vec<f32>) -> DomainIndex {
        let docs: Vec<PassageContent> = (0..lexical.len())
            .map(|i| PassageContent::from(format!("passage {i}")))
            .collect();
        DomainIndex::new(
            Box::new(FixedDense(dense, docs.len())),
            Box::new(FixedLexical(lexical)),
            docs,
        )
        .unwrap()
    }

    fn retriever(
        embedder: Arc<dyn EmbeddingEngine>,
        store: DomainIndexStore,
        config: PipelineConfig,
    ) -> HybridRetriever {
        let catalog = Arc::new(DomainCatalog::medical("/unused"));
        HybridRetriever::new(embedder, Arc::new(store), catalog, config).unwrap()
    }

    fn names(domains: &[&str]) -> Vec<String> {
        domains.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn two_document_domain_fuses_by_hand_computed_weights() {
        // Doc 0: dense 0.9, lexical 0.5 -> 0.54 + 0.20 = 0.74
        // Doc 1: dense 0.3, lexical 1.2 -> 0.18 + 0.48 = 0.66
        let mut store = DomainIndexStore::new();
        store.insert(
            "Cardiology",
            domain_index(vec![(0, 0.9), (1, 0.3)], vec![0.5, 1.2]),
        );
        let retriever = retriever(Arc::new(UnitEmbedder), store, PipelineConfig::default());

        let candidates = retriever
            .retrieve("chest pain", &names(&["Cardiology"]))
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].position, 0);
        assert!((candidates[0].fused_score - 0.74).abs() < 1e-6);
        assert_eq!(candidates[1].position, 1);
        assert!((candidates[1].fused_score - 0.66).abs() < 1e-6);
    }

    #[test]
    fn dense_score_defaults_to_zero_outside_dense_top_k() {
        let config = PipelineConfig::default();
        let dense: AHashMap<usize, f32> = [(0, 0.8)].into_iter().collect();
        let fused = fuse_scores(&dense, &[0.1, 2.0], &config);
        assert_eq!(fused[0].0, 1);
        assert!((fused[0].1 - 0.8).abs() < 1e-6);
        assert!((fused[1].1 - (0.6 * 0.8 + 0.4 * 0.1)).abs() < 1e-6);
    }

    #[test]
    fn dense_only_rows_are_not_candidates() {
        let config = PipelineConfig {
            lexical_top_k: 1,
            ..PipelineConfig::default()
        };
        let dense: AHashMap<usize, f32> = [(0, 1.0), (1, 0.2)].into_iter().collect();
        let fused = fuse_scores(&dense, &[0.0, 3.0], &config);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].0, 1);
    }

    #[test]
    fn results_are_capped_and_limited_to_routed_domains() {
        let mut store = DomainIndexStore::new();
        for domain in ["Cancer", "Cardiology", "Neurology"] {
            let lexical: Vec<f32> = (0..25).map(|i| i as f32 / 10.0).collect();
            store.insert(domain, domain_index(Vec::new(), lexical));
        }
        let retriever = retriever(Arc::new(UnitEmbedder), store, PipelineConfig::default());

        let candidates = retriever
            .retrieve("tumor", &names(&["Cancer", "Neurology"]))
            .unwrap();
        assert_eq!(candidates.len(), 30);
        assert!(candidates
            .iter()
            .all(|c| c.domain == "Cancer" || c.domain == "Neurology"));
        assert!(candidates
            .windows(2)
            .all(|w| w[0].fused_score >= w[1].fused_score));
    }

    #[test]
    fn unloaded_domain_contributes_nothing() {
        let retriever = retriever(
            Arc::new(UnitEmbedder),
            DomainIndexStore::new(),
            PipelineConfig::default(),
        );
        let candidates = retriever
            .retrieve("rash", &names(&["Dermatology"]))
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn unknown_domain_is_an_error() {
        let retriever = retriever(
            Arc::new(UnitEmbedder),
            DomainIndexStore::new(),
            PipelineConfig::default(),
        );
        let err = retriever
            .retrieve("bones", &names(&["Orthopedics"]))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownDomain(_)));
    }

    #[test]
    fn embedding_failure_falls_back_to_lexical_scores() {
        let mut store = DomainIndexStore::new();
        store.insert("Cancer", domain_index(vec![(0, 0.9)], vec![1.0]));
        let retriever = retriever(
            Arc::new(FailingEmbedder),
            store,
            PipelineConfig::default(),
        );

        let candidates = retriever.retrieve("tumor", &names(&["Cancer"])).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].fused_score - 0.4).abs() < 1e-6);
    }
}
