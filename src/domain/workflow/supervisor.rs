//! Supervisor - Workflow Routing State Machine
//!
//! Decides, turn by turn, which stage agent handles the user's message,
//! reconciles the returned status into the session, and advances through
//! the fixed stage order. Pure domain logic; the extractor is only reached
//! through the agents.

use std::sync::Arc;

use crate::domain::foundation::Stage;
use crate::domain::workflow::agents::{
    DescriptionAgent, IntentAgent, QuestionsAgent, StageAgent, StageView,
};
use crate::domain::workflow::errors::{AgentError, WorkflowError};
use crate::domain::workflow::records::StageRecord;
use crate::domain::workflow::session::WorkflowSession;
use crate::domain::workflow::turn::{TurnResult, TurnStatus};
use crate::ports::extractor::StructuredExtractor;

/// Reply used when the extractor fails and the turn must be retried.
const RETRY_REPLY: &str =
    "Sorry, I couldn't process that just now. Could you send it again, or rephrase?";

/// Reply for turns arriving after the workflow has concluded.
const CONCLUDED_REPLY: &str =
    "This hiring workflow has already concluded. Start a new session to work on another role.";

/// Routes each turn to the active stage agent and commits the outcome.
///
/// Exactly one agent is active per turn; dispatch is a fixed lookup over the
/// closed [`Stage`] enum. The session is only mutated after the agent's
/// result (including any extractor call) has fully resolved, so a failed or
/// cancelled turn leaves the pre-turn state intact.
pub struct Supervisor {
    intent: Arc<dyn StageAgent>,
    description: Arc<dyn StageAgent>,
    questions: Arc<dyn StageAgent>,
}

impl Supervisor {
    /// Creates a supervisor with the three standard stage agents sharing one
    /// extractor.
    pub fn new(extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self {
            intent: Arc::new(IntentAgent::new(extractor.clone())),
            description: Arc::new(DescriptionAgent::new(extractor.clone())),
            questions: Arc::new(QuestionsAgent::new(extractor)),
        }
    }

    /// Creates a supervisor from explicit agents.
    pub fn with_agents(
        intent: Arc<dyn StageAgent>,
        description: Arc<dyn StageAgent>,
        questions: Arc<dyn StageAgent>,
    ) -> Self {
        Self {
            intent,
            description,
            questions,
        }
    }

    /// Handles one user turn to completion and returns the reply.
    ///
    /// Recoverable extractor failures become a retry prompt with the session
    /// untouched; only routing defects surface as errors.
    pub async fn handle_turn(
        &self,
        session: &mut WorkflowSession,
        user_message: &str,
    ) -> Result<String, WorkflowError> {
        let stage = session.stage;

        if stage.is_terminal() {
            return Ok(CONCLUDED_REPLY.to_string());
        }

        let agent = self.agent_for(stage)?;
        let result = match agent.process(StageView::new(session), user_message).await {
            Ok(result) => result,
            Err(AgentError::Extractor(_)) => {
                return Ok(RETRY_REPLY.to_string());
            }
            Err(AgentError::Workflow(err)) => return Err(err),
        };

        self.commit(session, user_message, result)
    }

    /// Looks up the agent owning a non-terminal stage.
    fn agent_for(&self, stage: Stage) -> Result<&Arc<dyn StageAgent>, WorkflowError> {
        match stage {
            Stage::Intent => Ok(&self.intent),
            Stage::Description => Ok(&self.description),
            Stage::Questions => Ok(&self.questions),
            Stage::End => Err(WorkflowError::InvalidState(
                "no agent owns the terminal stage".to_string(),
            )),
        }
    }

    /// Applies a resolved turn to the session: record, approval, stage
    /// advance, and exactly one history entry per speaker.
    fn commit(
        &self,
        session: &mut WorkflowSession,
        user_message: &str,
        result: TurnResult,
    ) -> Result<String, WorkflowError> {
        let stage = session.stage;

        if result.record.stage() != stage {
            return Err(WorkflowError::InvalidState(format!(
                "agent for {} returned a {} record",
                stage,
                result.record.stage()
            )));
        }

        if result.status == TurnStatus::Approved && !Self::approval_is_valid(&result.record) {
            return Err(WorkflowError::InvalidState(format!(
                "stage {} reported approval on an unapproved or incomplete record",
                stage
            )));
        }

        match result.record {
            StageRecord::Intent(record) => session.intent = Some(record),
            StageRecord::Description(record) => session.description = Some(record),
            StageRecord::Questions(record) => session.questions = Some(record),
        }

        if result.status == TurnStatus::Approved {
            session.approve(stage);
            session.advance_stage();
        }

        session.record_turn(user_message, &result.reply);
        Ok(result.reply)
    }

    /// Approval gating: an approved record must be content-complete, and for
    /// approval-gated stages its own flag must be set.
    fn approval_is_valid(record: &StageRecord) -> bool {
        match record {
            StageRecord::Intent(r) => r.is_complete(),
            StageRecord::Description(r) => r.approved && r.is_content_complete(),
            StageRecord::Questions(r) => r.approved && r.is_content_complete(),
        }
    }
}
