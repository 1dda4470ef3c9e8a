use std::path::Path;

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{application::services::DenseIndex, domain::DomainError};

/// Exact inner-product index over row-major embeddings.
///
/// With L2-normalised rows and queries the inner product is the cosine
/// similarity, so scores stay within `[-1, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIpIndex {
    dims: u32,
    vectors: Vec<f32>,
}

impl FlatIpIndex {
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, DomainError> {
        let dims = rows.first().map(Vec::len).unwrap_or(0);
        if dims == 0 {
            return Err(DomainError::invalid_artifact(
                "dense index needs at least one non-empty row",
            ));
        }
        if let Some(bad) = rows.iter().position(|row| row.len() != dims) {
            return Err(DomainError::invalid_artifact(format!(
                "row {bad} has {} dimensions, expected {dims}",
                rows[bad].len()
            )));
        }
        Ok(Self {
            dims: dims as u32,
            vectors: rows.into_iter().flatten().collect(),
        })
    }

    /// Reads a bincode-encoded index written by [`FlatIpIndex::write_to`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DomainError::artifact_missing(path.display().to_string()));
        }
        let bytes = std::fs::read(path).map_err(|err| {
            DomainError::invalid_artifact(format!("failed to read {}: {err}", path.display()))
        })?;
        let index: Self = Self::decode(&bytes)?;
        index.validate()?;
        Ok(index)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let path = path.as_ref();
        let bytes = Self::encode(self)?;
        std::fs::write(path, bytes).map_err(|err| {
            DomainError::invalid_artifact(format!("failed to write {}: {err}", path.display()))
        })
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.dims == 0 || self.vectors.len() % self.dims as usize != 0 {
            return Err(DomainError::invalid_artifact(format!(
                "{} values cannot be split into rows of {} dimensions",
                self.vectors.len(),
                self.dims
            )));
        }
        Ok(())
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::invalid_artifact(format!("serialization error: {err}")))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::invalid_artifact(format!("deserialization error: {err}")))
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.dims as usize)
    }
}

impl DenseIndex for FlatIpIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, DomainError> {
        if query.len() != self.dims as usize {
            return Err(DomainError::index(format!(
                "query has {} dimensions but index has {}",
                query.len(),
                self.dims
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows()
            .enumerate()
            .map(|(row, vector)| (row, vector.iter().zip(query).map(|(a, b)| a * b).sum::<f32>()))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dims.max(1) as usize
    }

    fn dims(&self) -> usize {
        self.dims as usize
    }
}
