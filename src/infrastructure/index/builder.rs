use tracing::{info, warn};

use super::{read_documents, FlatIpIndex};
use crate::{
    application::services::EmbeddingEngine,
    domain::{DomainConfig, DomainError},
};

/// Embeds a domain's document collection and writes its dense index next to it.
///
/// Passages the engine cannot embed get a zero row, which keeps row `i`
/// aligned with document `i`. Returns the number of rows written.
pub fn build_dense_index(
    config: &DomainConfig,
    embedder: &dyn EmbeddingEngine,
) -> Result<usize, DomainError> {
    let documents = read_documents(&config.docs_path)?;
    let dims = embedder
        .dims()
        .ok_or_else(|| DomainError::embedding("embedding engine reports no dimensions"))?;

    let mut rows = Vec::with_capacity(documents.len());
    let mut skipped = 0usize;
    for (position, doc) in documents.iter().enumerate() {
        match embedder.embed(&doc.text()) {
            Ok(vector) if vector.len() == dims => rows.push(vector),
            Ok(vector) => {
                return Err(DomainError::embedding(format!(
                    "passage {position} embedded to {} dimensions, expected {dims}",
                    vector.len()
                )));
            }
            Err(err) => {
                skipped += 1;
                warn!(
                    target: "medirag::index",
                    domain = %config.name,
                    position,
                    "passage not embedded, writing zero row: {err}"
                );
                rows.push(vec![0.0; dims]);
            }
        }
    }

    let written = rows.len();
    FlatIpIndex::from_rows(rows)?.write_to(&config.index_path)?;
    info!(
        target: "medirag::index",
        domain = %config.name,
        rows = written,
        skipped,
        model = embedder.model(),
        "dense index written"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::DenseIndex;
    use crate::infrastructure::SimpleEmbedEngine;

    #[test]
    fn writes_one_row_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = DomainConfig::in_dir(dir.path(), "Dermatology", "dermatology_qa");
        std::fs::write(
            &config.docs_path,
            r#"["Eczema causes itchy skin.", {"question": "What is acne?", "answer": ""}, "   "]"#,
        )
        .unwrap();

        let engine = SimpleEmbedEngine::try_new("test", 32).unwrap();
        assert_eq!(build_dense_index(&config, &engine).unwrap(), 3);

        let index = FlatIpIndex::open(&config.index_path).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dims(), 32);

        let query = engine.embed("eczema itchy skin").unwrap();
        let hits = index.search(&query, 1).unwrap();
        assert_eq!(hits[0].0, 0);
    }

    #[test]
    fn missing_collection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = DomainConfig::in_dir(dir.path(), "Cancer", "cancer_qa");
        let engine = SimpleEmbedEngine::try_new("test", 16).unwrap();
        assert!(matches!(
            build_dense_index(&config, &engine),
            Err(DomainError::ArtifactMissing(_))
        ));
    }
}
