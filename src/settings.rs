use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default filename used to persist configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

/// Embedding backends compiled into the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Lightweight deterministic hash embedder (always available).
    Simple {
        #[serde(default = "default_simple_model")]
        model: String,
        #[serde(default = "default_simple_dim")]
        dimensions: usize,
    },
    /// Semantic embeddings powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed {
        #[serde(default = "default_fastembed_model")]
        model: String,
    },
}

impl EmbeddingBackend {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => "simple",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => "fastembed",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingBackend::Simple { model, .. } => model,
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { model } => model,
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        #[cfg(feature = "fastembed-engine")]
        {
            EmbeddingBackend::FastEmbed {
                model: default_fastembed_model(),
            }
        }
        #[cfg(not(feature = "fastembed-engine"))]
        {
            EmbeddingBackend::Simple {
                model: default_simple_model(),
                dimensions: default_simple_dim(),
            }
        }
    }
}

/// Reranking backends compiled into the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum RerankerBackend {
    /// Query-term overlap scoring (always available).
    TokenOverlap,
    /// Cross-encoder reranking powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed {
        #[serde(default = "default_rerank_model")]
        model: String,
    },
}

impl RerankerBackend {
    pub fn id(&self) -> &'static str {
        match self {
            RerankerBackend::TokenOverlap => "token-overlap",
            #[cfg(feature = "fastembed-engine")]
            RerankerBackend::FastEmbed { .. } => "fastembed",
        }
    }
}

impl Default for RerankerBackend {
    fn default() -> Self {
        #[cfg(feature = "fastembed-engine")]
        {
            RerankerBackend::FastEmbed {
                model: default_rerank_model(),
            }
        }
        #[cfg(not(feature = "fastembed-engine"))]
        {
            RerankerBackend::TokenOverlap
        }
    }
}

/// Where answers are generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum GeneratorBackend {
    /// No generation; every answer comes from the extractive fallback.
    #[default]
    Disabled,
    /// Hosted text-generation endpoint reached over HTTP.
    Remote {
        endpoint: String,
        #[serde(default = "default_generation_timeout")]
        timeout_secs: u64,
    },
}

impl GeneratorBackend {
    pub fn id(&self) -> &'static str {
        match self {
            GeneratorBackend::Disabled => "disabled",
            GeneratorBackend::Remote { .. } => "remote",
        }
    }
}

/// Complete persisted configuration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory holding `<Domain>_index.bin` and `<Domain>_docs.json`;
    /// defaults to `<data_dir>/indexes`.
    #[serde(default)]
    pub indexes_dir: Option<PathBuf>,
    #[serde(default)]
    pub embedding: EmbeddingBackend,
    #[serde(default)]
    pub reranker: RerankerBackend,
    #[serde(default)]
    pub generator: GeneratorBackend,
}

/// Loads `AppConfig` from `<data_dir>/config.json`.
pub struct ConfigManager {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    /// A missing file is created with defaults; an unreadable one is left
    /// untouched and defaults are used.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let manager = if path.exists() {
            let config = fs::read(&path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<AppConfig>(&bytes).ok())
                .unwrap_or_else(|| {
                    warn!(
                        target: "medirag::settings",
                        path = %path.display(),
                        "config file unreadable, using defaults"
                    );
                    AppConfig::default()
                });
            Self { path, config }
        } else {
            let manager = Self {
                path,
                config: AppConfig::default(),
            };
            manager.persist()?;
            manager
        };
        Ok(manager)
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the backing directory exists and write the JSON payload.
    fn persist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(&self.config)?;
        fs::write(&self.path, payload)
    }
}

const fn default_simple_dim() -> usize {
    384
}

fn default_simple_model() -> String {
    "medirag/simple-hash".to_string()
}

const fn default_generation_timeout() -> u64 {
    60
}

#[cfg(feature = "fastembed-engine")]
fn default_fastembed_model() -> String {
    crate::infrastructure::DEFAULT_FASTEMBED_MODEL.to_string()
}

#[cfg(feature = "fastembed-engine")]
fn default_rerank_model() -> String {
    crate::infrastructure::DEFAULT_RERANK_MODEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load(dir.path()).unwrap();
        assert_eq!(manager.current(), AppConfig::default());
        assert!(manager.path().exists());
    }

    #[test]
    fn reads_backend_selection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{
                "indexes_dir": "/srv/medirag/indexes",
                "embedding": {"backend": "simple", "dimensions": 64},
                "reranker": {"backend": "token-overlap"},
                "generator": {"backend": "remote", "endpoint": "http://localhost:8080/generate"}
            }"#,
        )
        .unwrap();

        let config = ConfigManager::load(dir.path()).unwrap().current();
        assert_eq!(config.indexes_dir, Some(PathBuf::from("/srv/medirag/indexes")));
        assert_eq!(
            config.embedding,
            EmbeddingBackend::Simple {
                model: "medirag/simple-hash".into(),
                dimensions: 64
            }
        );
        assert_eq!(config.reranker, RerankerBackend::TokenOverlap);
        assert_eq!(
            config.generator,
            GeneratorBackend::Remote {
                endpoint: "http://localhost:8080/generate".into(),
                timeout_secs: 60
            }
        );
    }

    #[test]
    fn corrupt_file_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "{not json").unwrap();

        let manager = ConfigManager::load(dir.path()).unwrap();
        assert_eq!(manager.current(), AppConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }
}
