//! Generation request/outcome types and the per-template state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::artifact::{ArtifactId, GenerationMethod};
use crate::template::{RequestId, TemplateId};

/// State of one template within one generation request.
///
/// ```text
/// PENDING -> AI_ATTEMPTED -> AI_SUCCEEDED ---------------------> DONE | ERROR
///                         \-> AI_FAILED -> DETERMINISTIC_USED -> DONE | ERROR
/// PENDING -> DETERMINISTIC_USED (forced / no AI) --------------> DONE | ERROR
/// PENDING -> ERROR (template unreadable, cancelled)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Pending,
    AiAttempted,
    AiSucceeded,
    AiFailed,
    DeterministicUsed,
    Done,
    Error,
}

impl GenerationState {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: GenerationState) -> bool {
        use GenerationState::*;
        matches!(
            (self, next),
            (Pending, AiAttempted)
                | (Pending, DeterministicUsed)
                | (Pending, Error)
                | (AiAttempted, AiSucceeded)
                | (AiAttempted, AiFailed)
                | (AiSucceeded, Done)
                | (AiSucceeded, Error)
                | (AiFailed, DeterministicUsed)
                | (DeterministicUsed, Done)
                | (DeterministicUsed, Error)
        )
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GenerationState::Pending => "PENDING",
            GenerationState::AiAttempted => "AI_ATTEMPTED",
            GenerationState::AiSucceeded => "AI_SUCCEEDED",
            GenerationState::AiFailed => "AI_FAILED",
            GenerationState::DeterministicUsed => "DETERMINISTIC_USED",
            GenerationState::Done => "DONE",
            GenerationState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Caller options for one generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Skip the AI strategy entirely.
    #[serde(default)]
    pub force_deterministic: bool,
    /// Reuse a request id to regenerate (replace) that request's artifacts.
    #[serde(default)]
    pub request_id: Option<RequestId>,
}

/// Terminal status of one template in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Done,
    Error,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Done => write!(f, "done"),
            OutcomeStatus::Error => write!(f, "error"),
        }
    }
}

/// Result for one requested template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateOutcome {
    pub template_id: TemplateId,
    pub status: OutcomeStatus,
    /// The stored artifact. Also set for `error` outcomes when an error
    /// artifact could be recorded.
    pub artifact_id: Option<ArtifactId>,
    pub method: Option<GenerationMethod>,
    pub error: Option<String>,
    /// Every state this template passed through, in order.
    pub states: Vec<GenerationState>,
}

impl TemplateOutcome {
    pub fn is_done(&self) -> bool {
        self.status == OutcomeStatus::Done
    }
}

/// Result of a whole generation request.
///
/// Enumerates every requested template exactly once, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub request_id: RequestId,
    pub outcomes: Vec<TemplateOutcome>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(TemplateOutcome::is_done)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_done()).count()
    }

    pub fn outcome(&self, template_id: &TemplateId) -> Option<&TemplateOutcome> {
        self.outcomes.iter().find(|o| &o.template_id == template_id)
    }
}
