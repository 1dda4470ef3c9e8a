use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use super::{Bm25Index, FlatIpIndex};
use crate::{
    application::services::{text::tokenize, DomainIndex, DomainIndexStore},
    domain::{DomainCatalog, DomainConfig, DomainError, PassageContent},
};

/// Loads every catalog domain whose dense index exists on disk.
///
/// Missing or unreadable artifacts are logged and the domain is left out of
/// the store; a broken domain never prevents the others from loading.
pub fn load_domain_store(catalog: &DomainCatalog) -> DomainIndexStore {
    let mut store = DomainIndexStore::new();

    for config in catalog.configs() {
        if !config.has_index() {
            let err = DomainError::artifact_missing(config.index_path.display().to_string());
            warn!(target: "medirag::index", domain = %config.name, "{err}; domain skipped");
            continue;
        }

        match load_domain(config) {
            Ok(index) => {
                info!(
                    target: "medirag::index",
                    domain = %config.name,
                    chunks = index.len(),
                    "domain index loaded"
                );
                store.insert(config.name.clone(), index);
            }
            Err(err) => {
                warn!(target: "medirag::index", domain = %config.name, "failed to load: {err}");
            }
        }
    }

    info!(
        target: "medirag::index",
        loaded = store.len(),
        total = catalog.len(),
        "domain indexes preloaded"
    );
    store
}

/// Dense index, documents and a freshly built BM25 index for one domain.
pub fn load_domain(config: &DomainConfig) -> Result<DomainIndex, DomainError> {
    let dense = FlatIpIndex::open(&config.index_path)?;
    let documents = read_documents(&config.docs_path)?;
    let corpus: Vec<Vec<String>> = documents
        .iter()
        .map(|doc| tokenize(&doc.indexable_text()))
        .collect();
    let lexical = Bm25Index::new(&corpus);

    DomainIndex::new(Box::new(dense), Box::new(lexical), documents)
}

/// Reads a document collection stored as a JSON array, or as an object whose
/// values are the documents (integer keys are taken in numeric order).
pub fn read_documents(path: impl AsRef<Path>) -> Result<Vec<PassageContent>, DomainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DomainError::artifact_missing(path.display().to_string()));
    }
    let bytes = std::fs::read(path).map_err(|err| {
        DomainError::invalid_artifact(format!("failed to read {}: {err}", path.display()))
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
        DomainError::invalid_artifact(format!("failed to parse {}: {err}", path.display()))
    })?;

    match value {
        Value::Array(items) => Ok(items.into_iter().map(PassageContent::from_value).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            if entries.iter().all(|(key, _)| key.parse::<usize>().is_ok()) {
                entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
            }
            Ok(entries
                .into_iter()
                .map(|(_, doc)| PassageContent::from_value(doc))
                .collect())
        }
        other => Err(DomainError::invalid_artifact(format!(
            "{} must hold an array or object of documents, found {}",
            path.display(),
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::LexicalIndex;

    fn write_domain(dir: &Path, name: &str, rows: Vec<Vec<f32>>, docs: &str) {
        FlatIpIndex::from_rows(rows)
            .unwrap()
            .write_to(dir.join(format!("{name}_index.bin")))
            .unwrap();
        std::fs::write(dir.join(format!("{name}_docs.json")), docs).unwrap();
    }

    #[test]
    fn loads_present_domains_and_skips_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        write_domain(
            dir.path(),
            "Cardiology",
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            r#"["Angina is chest pain.", {"question": "q", "answer": "Arrhythmia."}]"#,
        );

        let catalog = DomainCatalog::medical(dir.path());
        let store = load_domain_store(&catalog);

        assert_eq!(store.loaded(), vec!["Cardiology"]);
        let cardio = store.get("Cardiology").unwrap();
        assert_eq!(cardio.len(), 2);
        assert_eq!(cardio.lexical().len(), 2);
        assert_eq!(cardio.document(1).unwrap().text(), "Arrhythmia.");
        assert!(matches!(
            store.get("Cancer"),
            Err(DomainError::NotLoaded(name)) if name == "Cancer"
        ));
    }

    #[test]
    fn misaligned_collection_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_domain(
            dir.path(),
            "Neurology",
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            r#"["only one document"]"#,
        );

        let store = load_domain_store(&DomainCatalog::medical(dir.path()));
        assert!(store.is_empty());
    }

    #[test]
    fn object_collections_follow_numeric_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(&path, r#"{"10": "ten", "2": "two", "0": "zero"}"#).unwrap();

        let docs = read_documents(&path).unwrap();
        let texts: Vec<String> = docs.iter().map(|d| d.text().into_owned()).collect();
        assert_eq!(texts, vec!["zero", "two", "ten"]);
    }

    #[test]
    fn missing_documents_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_documents(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DomainError::ArtifactMissing(_)));
    }
}
