//! Generator used when no generation backend is configured.
//!
//! Every call fails, so answers are always built by the extractive fallback.

use crate::{
    application::services::{GenerationParams, TextGenerator},
    domain::DomainError,
};

#[derive(Debug, Default, Clone)]
pub struct NoOpGenerator;

impl TextGenerator for NoOpGenerator {
    fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, DomainError> {
        Err(DomainError::generation("generation backend disabled"))
    }

    fn id(&self) -> &str {
        "disabled"
    }
}
