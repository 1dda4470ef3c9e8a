use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::DomainError;

/// Domains the medical knowledge base ships with, in routing order.
pub const MEDICAL_DOMAINS: [(&str, &str); 5] = [
    ("Cancer", "Cancer Medical QA"),
    ("Cardiology", "Cardiology Medical QA"),
    ("Dermatology", "Dermatology Medical QA"),
    ("Diabetes-Digestive-Kidney", "Diabetes/Digestive/Kidney Medical QA"),
    ("Neurology", "Neurology Medical QA"),
];

/// Static description of one knowledge domain and where its artifacts live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainConfig {
    pub name: String,
    pub dataset_name: String,
    pub index_path: PathBuf,
    pub docs_path: PathBuf,
}

impl DomainConfig {
    pub fn new(
        name: impl Into<String>,
        dataset_name: impl Into<String>,
        index_path: impl Into<PathBuf>,
        docs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            dataset_name: dataset_name.into(),
            index_path: index_path.into(),
            docs_path: docs_path.into(),
        }
    }

    /// Config following the `<Name>_index.bin` / `<Name>_docs.json` layout.
    pub fn in_dir(
        indexes_dir: &Path,
        name: impl Into<String>,
        dataset_name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let index_path = indexes_dir.join(format!("{name}_index.bin"));
        let docs_path = indexes_dir.join(format!("{name}_docs.json"));
        Self::new(name, dataset_name, index_path, docs_path)
    }

    pub fn has_index(&self) -> bool {
        self.index_path.exists()
    }
}

/// Immutable registry of known domains, fixed at process start.
#[derive(Debug, Clone)]
pub struct DomainCatalog {
    configs: Vec<DomainConfig>,
}

impl DomainCatalog {
    pub fn new(configs: Vec<DomainConfig>) -> Self {
        Self { configs }
    }

    /// The five medical domains with artifacts expected under `indexes_dir`.
    pub fn medical(indexes_dir: impl AsRef<Path>) -> Self {
        let dir = indexes_dir.as_ref();
        Self::new(
            MEDICAL_DOMAINS
                .iter()
                .map(|(name, dataset)| DomainConfig::in_dir(dir, *name, *dataset))
                .collect(),
        )
    }

    pub fn configs(&self) -> &[DomainConfig] {
        &self.configs
    }

    pub fn get(&self, name: &str) -> Result<&DomainConfig, DomainError> {
        self.configs
            .iter()
            .find(|config| config.name == name)
            .ok_or_else(|| DomainError::unknown_domain(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.configs.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medical_catalog_lays_out_artifact_paths() {
        let catalog = DomainCatalog::medical("/data/indexes");
        assert_eq!(catalog.len(), 5);

        let cardio = catalog.get("Cardiology").unwrap();
        assert_eq!(cardio.dataset_name, "Cardiology Medical QA");
        assert_eq!(
            cardio.index_path,
            PathBuf::from("/data/indexes/Cardiology_index.bin")
        );
        assert_eq!(
            cardio.docs_path,
            PathBuf::from("/data/indexes/Cardiology_docs.json")
        );
    }

    #[test]
    fn unknown_lookup_fails() {
        let catalog = DomainCatalog::medical("/data/indexes");
        let err = catalog.get("Orthopedics").unwrap_err();
        assert!(matches!(err, DomainError::UnknownDomain(name) if name == "Orthopedics"));
    }
}
