use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainCatalog, QueryResult, SourceExcerpt};

/// Question submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
    /// Accepted for compatibility with chat clients; not used by the pipeline.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Answer envelope returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub query: String,
    pub answer: String,
    pub domains: Vec<String>,
    pub confidence: f32,
    pub processing_time: f64,
    pub sources: Vec<SourceExcerpt>,
    pub is_emergency: bool,
}

impl From<QueryResult> for AskResponse {
    fn from(value: QueryResult) -> Self {
        Self {
            query: value.query,
            answer: value.answer,
            domains: value.domains,
            confidence: value.confidence,
            processing_time: value.processing_time,
            sources: value.sources,
            is_emergency: value.is_emergency,
        }
    }
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub status: String,
    pub pipeline_initialized: bool,
    pub available_domains: usize,
    pub domain_names: Vec<String>,
    pub loaded_domains: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatusResponse {
    pub fn healthy(catalog: &DomainCatalog, loaded_domains: Vec<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            pipeline_initialized: true,
            available_domains: catalog.len(),
            domain_names: catalog.names(),
            loaded_domains,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainInfo {
    pub name: String,
    pub dataset: String,
    pub has_index: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainListResponse {
    pub domains: Vec<DomainInfo>,
    pub total: usize,
}

impl From<&DomainCatalog> for DomainListResponse {
    fn from(catalog: &DomainCatalog) -> Self {
        let domains: Vec<DomainInfo> = catalog
            .configs()
            .iter()
            .map(|config| DomainInfo {
                name: config.name.clone(),
                dataset: config.dataset_name.clone(),
                has_index: config.has_index(),
            })
            .collect();
        Self {
            total: domains.len(),
            domains,
        }
    }
}
