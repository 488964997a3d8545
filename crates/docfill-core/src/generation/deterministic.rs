//! Deterministic strategy: literal token substitution.

use docfill_types::artifact::GenerationMethod;
use docfill_types::config::MappingConfig;
use docfill_types::error::GeneratorError;

use super::generator::{GenerationInput, Generator};
use crate::template::rewriter::rewrite;

/// Fills a template by replacing every recorded token with its mapped value.
///
/// Unresolved placeholders become the configured sentinel, so no raw token
/// survives. Never calls out of process.
#[derive(Debug, Clone)]
pub struct DeterministicRewriter {
    sentinel: String,
}

impl DeterministicRewriter {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn from_config(config: &MappingConfig) -> Self {
        Self::new(config.sentinel())
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }
}

impl Default for DeterministicRewriter {
    fn default() -> Self {
        Self::from_config(&MappingConfig::default())
    }
}

impl Generator for DeterministicRewriter {
    fn method(&self) -> GenerationMethod {
        GenerationMethod::Deterministic
    }

    async fn generate(&self, input: &GenerationInput) -> Result<String, GeneratorError> {
        rewrite(&input.template, &input.mappings, &self.sentinel)
    }
}
