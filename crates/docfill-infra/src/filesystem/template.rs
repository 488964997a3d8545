//! Local filesystem template store.

use std::path::PathBuf;

use docfill_core::repository::TemplateStore;
use docfill_types::error::RepositoryError;
use docfill_types::template::TemplateId;

use super::{contained_path, read_error};

/// Reads template bodies from `{root}/{template_id}`.
///
/// The template id is the file name, e.g. `trust.html`.
#[derive(Debug, Clone)]
pub struct LocalTemplateStore {
    root: PathBuf,
}

impl LocalTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Write a template body, creating the directory if needed.
    pub async fn put_template(&self, id: &TemplateId, body: &str) -> Result<(), RepositoryError> {
        let path = contained_path(&self.root, id.as_str())?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))
    }
}

impl TemplateStore for LocalTemplateStore {
    async fn get_template_body(&self, id: &TemplateId) -> Result<String, RepositoryError> {
        let path = contained_path(&self.root, id.as_str())?;
        tokio::fs::read_to_string(&path).await.map_err(read_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_read_template() {
        let dir = tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path().join("templates"));
        let id = TemplateId::from("trust.html");

        store.put_template(&id, "<p>{{grantor_name}}</p>").await.unwrap();
        let body = store.get_template_body(&id).await.unwrap();
        assert_eq!(body, "<p>{{grantor_name}}</p>");
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path());
        let err = store
            .get_template_body(&TemplateId::from("missing.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path());
        let err = store
            .get_template_body(&TemplateId::from("../config.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
