//! Error types for the workflow domain.

use crate::domain::foundation::Stage;
use crate::ports::extractor::ExtractorError;

/// Fatal internal errors in the routing state machine.
///
/// These indicate a defect in supervisor logic, never bad user input, and
/// must abort the turn rather than be worked around.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum WorkflowError {
    #[error("stage {stage} dispatched without required context: {missing}")]
    PreconditionViolation { stage: Stage, missing: String },

    #[error("invalid workflow state: {0}")]
    InvalidState(String),
}

/// Errors a stage agent can surface while processing a turn.
///
/// Extractor failures are recoverable (the supervisor turns them into a
/// retry prompt); workflow errors are fatal.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}
