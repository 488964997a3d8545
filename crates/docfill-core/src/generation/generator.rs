//! The `Generator` strategy trait.

use std::sync::Arc;

use docfill_types::answer::AnswerSet;
use docfill_types::artifact::GenerationMethod;
use docfill_types::error::GeneratorError;
use docfill_types::mapping::FieldMapping;
use docfill_types::template::TemplateId;

use crate::template::extractor::ParsedTemplate;

/// Everything a strategy needs to fill one template.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub template_id: TemplateId,
    pub template: ParsedTemplate,
    /// One entry per placeholder in `template`, in inventory order.
    pub mappings: Vec<FieldMapping>,
    /// The request's answers, shared read-only across the batch.
    pub answers: Arc<AnswerSet>,
}

/// A strategy that produces a filled document body.
///
/// Two implementations exist: [`GenerativeAssembler`] (AI, allowed to fail)
/// and [`DeterministicRewriter`] (literal substitution).
///
/// [`GenerativeAssembler`]: super::assembler::GenerativeAssembler
/// [`DeterministicRewriter`]: super::deterministic::DeterministicRewriter
pub trait Generator: Send + Sync {
    fn method(&self) -> GenerationMethod;

    fn generate(
        &self,
        input: &GenerationInput,
    ) -> impl std::future::Future<Output = Result<String, GeneratorError>> + Send;
}
