//! Application layer wiring DTOs and services for the answering pipeline.

pub mod dtos;
pub mod services;

pub use dtos::{AskRequest, AskResponse, DomainInfo, DomainListResponse, HealthStatusResponse};
pub use services::{PipelineConfig, QueryOrchestrator};
