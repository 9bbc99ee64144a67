//! Stage agents: one per workflow stage, sharing a single turn contract.
//!
//! Every agent follows the same shape: merge the user's message into the
//! accumulated record via the extractor, apply the stage's completeness
//! predicate, and classify approval where the stage has an approval gate.

mod description;
mod intent;
mod questions;

pub use description::DescriptionAgent;
pub use intent::IntentAgent;
pub use questions::QuestionsAgent;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::foundation::Stage;
use crate::domain::workflow::errors::AgentError;
use crate::domain::workflow::records::{DescriptionRecord, IntentRecord, QuestionsRecord};
use crate::domain::workflow::schema::SchemaViolations;
use crate::domain::workflow::session::WorkflowSession;
use crate::domain::workflow::turn::TurnResult;
use crate::ports::extractor::{ExtractionRequest, ExtractorError, StructuredExtractor};

/// Confidence below which an approval/rejection classification is treated
/// as unclear and the user is asked to restate their decision.
pub const APPROVAL_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Read-only view of the session handed to a stage agent for one turn.
///
/// Agents see their own accumulated record plus prior stages' approved
/// records; all mutation goes through the supervisor's commit.
#[derive(Debug, Clone, Copy)]
pub struct StageView<'a> {
    session: &'a WorkflowSession,
}

impl<'a> StageView<'a> {
    pub fn new(session: &'a WorkflowSession) -> Self {
        Self { session }
    }

    pub fn intent(&self) -> Option<&'a IntentRecord> {
        self.session.intent.as_ref()
    }

    pub fn description(&self) -> Option<&'a DescriptionRecord> {
        self.session.description.as_ref()
    }

    pub fn questions(&self) -> Option<&'a QuestionsRecord> {
        self.session.questions.as_ref()
    }

    /// Intent record, only once the Intent stage is approved.
    pub fn approved_intent(&self) -> Option<&'a IntentRecord> {
        self.session.approved_intent()
    }

    /// Description record, only once the Description stage is approved.
    pub fn approved_description(&self) -> Option<&'a DescriptionRecord> {
        self.session.approved_description()
    }
}

/// The turn-handling contract every stage agent implements.
#[async_trait]
pub trait StageAgent: Send + Sync {
    /// The stage this agent owns.
    fn stage(&self) -> Stage;

    /// Processes one user turn against a read-only session view.
    ///
    /// Implementations must not hold partial results across calls; the
    /// returned [`TurnResult`] is the turn's entire effect.
    async fn process(
        &self,
        view: StageView<'_>,
        user_message: &str,
    ) -> Result<TurnResult, AgentError>;
}

/// Outcome of one extraction call after deterministic post-validation.
pub(crate) enum Extraction<T> {
    /// Schema-valid candidate, deserialized into the stage's type.
    Candidate {
        value: T,
        confidence: Option<f32>,
    },
    /// The capability answered, but the response failed type validation.
    Invalid(SchemaViolations),
}

/// Calls the extractor and type-checks the response against the request's
/// schema before deserializing it.
pub(crate) async fn extract_into<T>(
    extractor: &dyn StructuredExtractor,
    request: ExtractionRequest,
) -> Result<Extraction<T>, AgentError>
where
    T: DeserializeOwned,
{
    let schema = request.schema.clone();
    let output = extractor.extract(request).await?;

    if let Err(violations) = schema.validate(&output.record) {
        return Ok(Extraction::Invalid(violations));
    }

    let value = serde_json::from_value(output.record)
        .map_err(|e| AgentError::Extractor(ExtractorError::parse(e.to_string())))?;

    Ok(Extraction::Candidate {
        value,
        confidence: output.confidence,
    })
}

/// True when a classification confidence is too low to act on.
pub(crate) fn is_low_confidence(confidence: Option<f32>) -> bool {
    confidence.is_some_and(|c| c < APPROVAL_CONFIDENCE_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn test_stage_view_scopes_approved_records() {
        let mut session = WorkflowSession::new(SessionId::new());
        session.intent = Some(IntentRecord {
            company: "Acme".to_string(),
            ..Default::default()
        });

        let view = StageView::new(&session);
        assert!(view.intent().is_some());
        assert!(view.approved_intent().is_none());

        session.approve(Stage::Intent);
        let view = StageView::new(&session);
        assert!(view.approved_intent().is_some());
    }

    #[test]
    fn test_low_confidence_threshold() {
        assert!(is_low_confidence(Some(0.2)));
        assert!(!is_low_confidence(Some(0.9)));
        assert!(!is_low_confidence(None));
    }
}
