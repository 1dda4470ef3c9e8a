use std::fs;
use std::path::Path;
use std::sync::Arc;

use medirag_lib::application::services::{
    HybridRetriever, PipelineConfig, Reranker, EMERGENCY_MESSAGE, EMERGENCY_REMINDER,
    INSUFFICIENT_INFORMATION_MESSAGE, PROFESSIONAL_DISCLAIMER,
};
use medirag_lib::domain::DomainConfig;
use medirag_lib::infrastructure::{build_dense_index, SimpleEmbedEngine, TokenOverlapReranker};
use medirag_lib::{build_environment_at, AppHandles};

const CONFIG: &str = r#"{
    "embedding": {"backend": "simple", "model": "medirag/simple-hash", "dimensions": 64},
    "reranker": {"backend": "token-overlap"},
    "generator": {"backend": "disabled"}
}"#;

const CARDIOLOGY_DOCS: &str = r#"[
    "Chest pain causes include angina, heart attack and pericarditis. What matters most is how sudden the pain is.",
    "What causes chest pain in young adults is often muscle strain or anxiety rather than heart disease.",
    {"question": "What causes chest pain after eating?", "answer": "Chest pain after meals causes worry, but what it usually reflects is acid reflux irritating the oesophagus."},
    "Eczema is an itchy inflammatory skin condition treated with moisturisers and topical steroids."
]"#;

fn write_domain(indexes_dir: &Path, name: &str, docs: &str) -> DomainConfig {
    let config = DomainConfig::in_dir(indexes_dir, name, "fixture");
    fs::write(&config.docs_path, docs).unwrap();
    let engine = SimpleEmbedEngine::try_new("medirag/simple-hash", 64).unwrap();
    build_dense_index(&config, &engine).unwrap();
    config
}

fn environment() -> (tempfile::TempDir, AppHandles) {
    environment_with_cardiology(CARDIOLOGY_DOCS)
}

fn environment_with_cardiology(docs: &str) -> (tempfile::TempDir, AppHandles) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.json"), CONFIG).unwrap();
    let indexes_dir = dir.path().join("indexes");
    fs::create_dir_all(&indexes_dir).unwrap();
    write_domain(&indexes_dir, "Cardiology", docs);

    let handles = build_environment_at(dir.path().to_path_buf()).unwrap();
    (dir, handles)
}

#[test]
fn loads_only_domains_with_artifacts() {
    let (_dir, handles) = environment();
    assert_eq!(handles.store.loaded(), vec!["Cardiology".to_string()]);
    assert_eq!(handles.store.get("Cardiology").unwrap().len(), 4);
    assert_eq!(handles.catalog.len(), 5);
}

#[test]
fn emergency_question_is_answered_from_retrieved_passages() {
    let (_dir, handles) = environment();
    let result = handles.orchestrator.run_query("What causes chest pain?");

    assert!(result.is_emergency);
    assert_eq!(result.domains, vec!["Cardiology".to_string()]);
    assert!((result.confidence - 0.75).abs() < 1e-6);
    assert_ne!(result.answer, EMERGENCY_MESSAGE);
    // Generation is disabled, so the extractive answer closes with the disclaimer.
    assert!(result.answer.ends_with(PROFESSIONAL_DISCLAIMER));
    assert!(!result.answer.contains(EMERGENCY_REMINDER.trim()));
    assert!(result.answer.to_lowercase().contains("chest pain"));

    assert_eq!(result.sources.len(), 3);
    for source in &result.sources {
        assert_eq!(source.domain, "Cardiology");
        assert_eq!(source.score, 1.0);
        assert!(!source.chunk.contains("Eczema"));
    }
}

#[test]
fn non_emergency_answer_ends_with_disclaimer() {
    let (_dir, handles) = environment();
    let result = handles
        .orchestrator
        .run_query("Is heart disease behind chest discomfort in young adults?");

    assert!(!result.is_emergency);
    assert_eq!(result.domains, vec!["Cardiology".to_string()]);
    assert!(result.answer.ends_with(PROFESSIONAL_DISCLAIMER));
}

#[test]
fn passage_identical_to_query_ranks_first_through_reranking() {
    const QUESTION: &str = "What are the early warning signs of heart failure?";
    let (_dir, handles) = environment_with_cardiology(&format!("[\"{QUESTION}\"]"));
    let domains = vec!["Cardiology".to_string()];

    let retriever = HybridRetriever::new(
        Arc::clone(&handles.embedder),
        Arc::clone(&handles.store),
        Arc::clone(&handles.catalog),
        PipelineConfig::default(),
    )
    .unwrap();
    let candidates = retriever.retrieve(QUESTION, &domains).unwrap();
    assert_eq!(candidates[0].text(), QUESTION);

    let ranked = Reranker::new(Arc::new(TokenOverlapReranker::new()), 5).rerank(QUESTION, candidates);
    assert_eq!(ranked[0].text(), QUESTION);
    assert_eq!(ranked[0].rerank_score, Some(1.0));

    let result = handles.orchestrator.run_query(QUESTION);
    assert_eq!(result.domains, domains);
    assert_eq!(result.sources[0].chunk, QUESTION);
    assert_eq!(result.sources[0].score, 1.0);
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn routed_domain_without_index_has_insufficient_information() {
    let (_dir, handles) = environment();
    let result = handles.orchestrator.run_query("How do I treat acne?");

    assert_eq!(result.domains, vec!["Dermatology".to_string()]);
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION_MESSAGE);
    assert_eq!(result.confidence, 0.5);
    assert!(result.sources.is_empty());
}

#[test]
fn misaligned_artifacts_exclude_the_domain() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.json"), CONFIG).unwrap();
    let indexes_dir = dir.path().join("indexes");
    fs::create_dir_all(&indexes_dir).unwrap();

    write_domain(&indexes_dir, "Cardiology", CARDIOLOGY_DOCS);
    let neurology = write_domain(
        &indexes_dir,
        "Neurology",
        r#"["Migraines are recurrent headaches."]"#,
    );
    fs::write(&neurology.docs_path, r#"["one", "two"]"#).unwrap();

    let handles = build_environment_at(dir.path().to_path_buf()).unwrap();
    assert!(handles.store.contains("Cardiology"));
    assert!(!handles.store.contains("Neurology"));

    let result = handles.orchestrator.run_query("what triggers a migraine");
    assert_eq!(result.domains, vec!["Neurology".to_string()]);
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION_MESSAGE);
}
