//! Domain layer: knowledge-domain catalog and the entities a query produces.

pub mod catalog;
pub mod errors;
pub mod models;

pub use catalog::{DomainCatalog, DomainConfig, MEDICAL_DOMAINS};
pub use errors::DomainError;
pub use models::{Candidate, PassageContent, QueryResult, SourceExcerpt};
