//! Template store trait definition.

use docfill_types::error::RepositoryError;
use docfill_types::template::TemplateId;

/// Read access to uploaded template bodies.
///
/// Templates are immutable per id, so implementations may cache freely.
pub trait TemplateStore: Send + Sync {
    /// The raw text body of a template. `RepositoryError::NotFound` when
    /// no template has this id.
    fn get_template_body(
        &self,
        id: &TemplateId,
    ) -> impl std::future::Future<Output = Result<String, RepositoryError>> + Send;
}
