use thiserror::Error;

use crate::llm::LlmError;

/// Errors from store operations (used by trait definitions in docfill-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(String),
}

/// A single generation strategy failed.
///
/// For the AI strategy this is an expected outcome that triggers fallback.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("language generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("language generation timed out after {0}s")]
    Timeout(u64),

    #[error("generated body is empty")]
    EmptyOutput,

    #[error("generated body still contains placeholder tokens: {}", .0.join(", "))]
    UnfilledTokens(Vec<String>),

    #[error("generated body too short: {actual} chars, expected at least {minimum}")]
    TooShort { actual: usize, minimum: usize },

    #[error("template body does not match placeholder '{key}' at offset {offset}")]
    TemplateMismatch { key: String, offset: usize },
}

/// Terminal failure of one template within a generation request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("template unavailable: {0}")]
    TemplateUnavailable(String),

    #[error("template body is empty")]
    EmptyTemplate,

    #[error("deterministic rewrite failed: {0}")]
    Deterministic(GeneratorError),

    #[error("artifact store error: {0}")]
    ArtifactStore(String),

    #[error("cancelled before start")]
    Cancelled,

    #[error("generation task failed: {0}")]
    TaskFailed(String),
}
