//! In-memory artifact store backed by `DashMap`.
//!
//! Used for ephemeral runs (`docfill generate --ephemeral`). Nothing
//! survives the process.

use chrono::Utc;
use dashmap::DashMap;

use docfill_core::repository::ArtifactStore;
use docfill_types::artifact::{Artifact, ArtifactId, ArtifactMetadata};
use docfill_types::error::RepositoryError;
use docfill_types::template::{RequestId, TemplateId};

/// Artifacts keyed by (template, request), replaced in place on rewrite.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: DashMap<(TemplateId, RequestId), Artifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    async fn put_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
        body: &str,
        metadata: &ArtifactMetadata,
    ) -> Result<ArtifactId, RepositoryError> {
        let now = Utc::now();
        let mut entry = self
            .artifacts
            .entry((template_id.clone(), *request_id))
            .or_insert_with(|| Artifact {
                id: ArtifactId::new(),
                template_id: template_id.clone(),
                request_id: *request_id,
                body: String::new(),
                metadata: metadata.clone(),
                created_at: now,
                updated_at: now,
            });

        let artifact = entry.value_mut();
        artifact.body = body.to_string();
        artifact.metadata = metadata.clone();
        artifact.updated_at = now;
        Ok(artifact.id)
    }

    async fn get_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
    ) -> Result<Option<Artifact>, RepositoryError> {
        Ok(self
            .artifacts
            .get(&(template_id.clone(), *request_id))
            .map(|a| a.value().clone()))
    }

    async fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Artifact>, RepositoryError> {
        let mut found: Vec<Artifact> = self
            .artifacts
            .iter()
            .filter(|entry| entry.key().1 == *request_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.template_id.cmp(&b.template_id));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_types::artifact::{ArtifactStatus, GenerationMethod};
    use docfill_types::mapping::MappingSummary;

    fn metadata(method: GenerationMethod) -> ArtifactMetadata {
        ArtifactMetadata {
            status: ArtifactStatus::Generated,
            method: Some(method),
            mapping: MappingSummary::default(),
            ai_failure: None,
            error: None,
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_artifact_replaced_in_place() {
        let store = InMemoryArtifactStore::new();
        let template_id = TemplateId::from("trust.html");
        let request_id = RequestId::new();

        let first = store
            .put_artifact(&template_id, &request_id, "v1", &metadata(GenerationMethod::Ai))
            .await
            .unwrap();
        let second = store
            .put_artifact(&template_id, &request_id, "v2", &metadata(GenerationMethod::Deterministic))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_for_request(&request_id).await.unwrap().len(), 1);
        let artifact = store.get_artifact(&template_id, &request_id).await.unwrap().unwrap();
        assert_eq!(artifact.body, "v2");
        assert_eq!(artifact.metadata.method, Some(GenerationMethod::Deterministic));
    }

    #[tokio::test]
    async fn test_list_filters_by_request_and_sorts() {
        let store = InMemoryArtifactStore::new();
        let (r1, r2) = (RequestId::new(), RequestId::new());
        for id in ["b", "a"] {
            store
                .put_artifact(&TemplateId::from(id), &r1, id, &metadata(GenerationMethod::Ai))
                .await
                .unwrap();
        }
        store
            .put_artifact(&TemplateId::from("c"), &r2, "c", &metadata(GenerationMethod::Ai))
            .await
            .unwrap();

        let listed = store.list_for_request(&r1).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|a| a.template_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
