//! Artifact store trait definition.

use docfill_types::artifact::{Artifact, ArtifactId, ArtifactMetadata};
use docfill_types::error::RepositoryError;
use docfill_types::template::{RequestId, TemplateId};

/// Persistence for generated documents.
///
/// Artifacts are keyed by (template, request). Writing the same pair twice
/// replaces the body and metadata of the existing artifact and keeps its id,
/// so regeneration never appends a second artifact. Concurrent writers for
/// different pairs never collide.
pub trait ArtifactStore: Send + Sync {
    /// Insert or replace the artifact for `(template_id, request_id)`.
    fn put_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
        body: &str,
        metadata: &ArtifactMetadata,
    ) -> impl std::future::Future<Output = Result<ArtifactId, RepositoryError>> + Send;

    fn get_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
    ) -> impl std::future::Future<Output = Result<Option<Artifact>, RepositoryError>> + Send;

    /// Every artifact of one request, ordered by template id.
    fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> impl std::future::Future<Output = Result<Vec<Artifact>, RepositoryError>> + Send;
}
