//! Answer store trait definition.

use docfill_types::answer::AnswerSet;
use docfill_types::error::RepositoryError;
use docfill_types::template::IntakeId;

/// Read access to the answers collected by one intake session.
pub trait AnswerStore: Send + Sync {
    fn get_answers(
        &self,
        intake: &IntakeId,
    ) -> impl std::future::Future<Output = Result<AnswerSet, RepositoryError>> + Send;
}
