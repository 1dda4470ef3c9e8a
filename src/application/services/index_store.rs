use std::collections::HashMap;

use crate::{
    application::services::{DenseIndex, LexicalIndex},
    domain::{DomainError, PassageContent},
};

/// Dense index, lexical index and document collection of one domain.
///
/// Row `i` of both indexes and entry `i` of the collection are the same passage.
pub struct DomainIndex {
    dense: Box<dyn DenseIndex>,
    lexical: Box<dyn LexicalIndex>,
    documents: Vec<PassageContent>,
}

impl DomainIndex {
    pub fn new(
        dense: Box<dyn DenseIndex>,
        lexical: Box<dyn LexicalIndex>,
        documents: Vec<PassageContent>,
    ) -> Result<Self, DomainError> {
        if dense.len() != documents.len() {
            return Err(DomainError::invalid_artifact(format!(
                "dense index has {} rows but collection has {} documents",
                dense.len(),
                documents.len()
            )));
        }
        if lexical.len() != documents.len() {
            return Err(DomainError::invalid_artifact(format!(
                "lexical index has {} rows but collection has {} documents",
                lexical.len(),
                documents.len()
            )));
        }
        Ok(Self {
            dense,
            lexical,
            documents,
        })
    }

    pub fn dense(&self) -> &dyn DenseIndex {
        self.dense.as_ref()
    }

    pub fn lexical(&self) -> &dyn LexicalIndex {
        self.lexical.as_ref()
    }

    pub fn document(&self, position: usize) -> Option<&PassageContent> {
        self.documents.get(position)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Per-domain indexes loaded once at startup and read-only afterwards.
///
/// Domains whose artifacts were missing are absent, not present-but-empty.
#[derive(Default)]
pub struct DomainIndexStore {
    domains: HashMap<String, DomainIndex>,
}

impl DomainIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, index: DomainIndex) {
        self.domains.insert(name.into(), index);
    }

    pub fn get(&self, name: &str) -> Result<&DomainIndex, DomainError> {
        self.domains
            .get(name)
            .ok_or_else(|| DomainError::not_loaded(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.domains.contains_key(name)
    }

    /// Loaded domain names, sorted.
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.domains.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl FromIterator<(String, DomainIndex)> for DomainIndexStore {
    fn from_iter<I: IntoIterator<Item = (String, DomainIndex)>>(iter: I) -> Self {
        Self {
            domains: iter.into_iter().collect(),
        }
    }
}
