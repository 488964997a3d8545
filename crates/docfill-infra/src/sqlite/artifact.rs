//! SQLite artifact store implementation.
//!
//! Implements `ArtifactStore` from `docfill-core`. Artifacts are unique per
//! (template_id, request_id); a second write for the same pair updates the
//! row in place. Metadata is stored as JSON text.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use docfill_core::repository::ArtifactStore;
use docfill_types::artifact::{Artifact, ArtifactId, ArtifactMetadata};
use docfill_types::error::RepositoryError;
use docfill_types::template::{RequestId, TemplateId};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ArtifactStore`.
#[derive(Clone)]
pub struct SqliteArtifactStore {
    pool: DatabasePool,
}

impl SqliteArtifactStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ArtifactRow {
    id: String,
    template_id: String,
    request_id: String,
    body: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl ArtifactRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            template_id: row.try_get("template_id")?,
            request_id: row.try_get("request_id")?,
            body: row.try_get("body")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_artifact(self) -> Result<Artifact, RepositoryError> {
        let id = parse_uuid(&self.id, "id")?;
        let request_id = parse_uuid(&self.request_id, "request_id")?;
        let metadata: ArtifactMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid metadata JSON: {e}")))?;

        Ok(Artifact {
            id: ArtifactId(id),
            template_id: TemplateId(self.template_id),
            request_id: RequestId::from_uuid(request_id),
            body: self.body,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, column: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {column}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ArtifactStore implementation
// ---------------------------------------------------------------------------

impl ArtifactStore for SqliteArtifactStore {
    async fn put_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
        body: &str,
        metadata: &ArtifactMetadata,
    ) -> Result<ArtifactId, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize metadata: {e}")))?;

        let row = sqlx::query(
            r#"INSERT INTO artifacts
                   (id, template_id, request_id, status, method, body, metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (template_id, request_id) DO UPDATE SET
                   status = excluded.status,
                   method = excluded.method,
                   body = excluded.body,
                   metadata = excluded.metadata,
                   updated_at = excluded.updated_at
               RETURNING id"#,
        )
        .bind(ArtifactId::new().to_string())
        .bind(template_id.as_str())
        .bind(request_id.to_string())
        .bind(metadata.status.to_string())
        .bind(metadata.method.map(|m| m.to_string()))
        .bind(body)
        .bind(&metadata_json)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let id: String = row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(ArtifactId(parse_uuid(&id, "id")?))
    }

    async fn get_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
    ) -> Result<Option<Artifact>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM artifacts WHERE template_id = ? AND request_id = ?")
            .bind(template_id.as_str())
            .bind(request_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let artifact_row = ArtifactRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(artifact_row.into_artifact()?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Artifact>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM artifacts WHERE request_id = ? ORDER BY template_id")
            .bind(request_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                ArtifactRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_artifact()
            })
            .collect()
    }
}
