//! Local filesystem answer store.

use std::path::{Path, PathBuf};

use docfill_core::repository::AnswerStore;
use docfill_types::answer::AnswerSet;
use docfill_types::error::RepositoryError;
use docfill_types::template::IntakeId;

use super::{contained_path, read_error};

/// Reads intake answers from `{root}/{intake_id}.json`.
///
/// Each file holds one JSON object of answer key to value. Key order in the
/// file is the declaration order the mapper uses for tie-breaking.
#[derive(Debug, Clone)]
pub struct LocalAnswerStore {
    root: PathBuf,
}

impl LocalAnswerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AnswerStore for LocalAnswerStore {
    async fn get_answers(&self, intake: &IntakeId) -> Result<AnswerSet, RepositoryError> {
        let path = contained_path(&self.root, &format!("{}.json", intake.0))?;
        load_answers_file(&path).await
    }
}

/// Parse a JSON answers file.
pub async fn load_answers_file(path: &Path) -> Result<AnswerSet, RepositoryError> {
    let content = tokio::fs::read_to_string(path).await.map_err(read_error)?;
    serde_json::from_str(&content).map_err(|e| {
        RepositoryError::Query(format!("invalid answers in {}: {e}", path.display()))
    })
}
