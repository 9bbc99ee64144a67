//! Questions stage agent: generates and revises the screening questions.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::foundation::Stage;
use crate::domain::workflow::errors::{AgentError, WorkflowError};
use crate::domain::workflow::records::{
    QuestionsCandidate, QuestionsRecord, StageRecord, REQUIRED_QUESTION_COUNT,
};
use crate::domain::workflow::schema::questions_schema;
use crate::domain::workflow::turn::{TurnResult, TurnStatus};
use crate::ports::extractor::{ExtractionRequest, StructuredExtractor};

use super::{extract_into, is_low_confidence, Extraction, StageAgent, StageView};

/// Generates technical screening questions grounded in the approved job
/// description, then runs the confirm/revise loop until the human approves.
///
/// Only a list of exactly [`REQUIRED_QUESTION_COUNT`] questions can be
/// approved. Requires the approved description record; being dispatched
/// without one is a routing defect.
pub struct QuestionsAgent {
    extractor: Arc<dyn StructuredExtractor>,
}

impl QuestionsAgent {
    pub fn new(extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self { extractor }
    }

    fn confirm_prompt() -> &'static str {
        "Would you like any changes to these questions, or shall I finalize them? (approve / request changes)"
    }

    fn count_reply(record: &QuestionsRecord) -> String {
        format!(
            "I have {} questions but need exactly {}. Ask me to regenerate or tell me what to add or remove.\n\n{}",
            record.questions.len(),
            REQUIRED_QUESTION_COUNT,
            record.numbered()
        )
    }

    fn first_generation(&self, candidate: &QuestionsCandidate) -> TurnResult {
        let record = QuestionsRecord::default().merge(candidate);

        if record.is_content_complete() {
            let reply = format!(
                "Here are {} proposed screening questions:\n\n{}\n\n{}",
                REQUIRED_QUESTION_COUNT,
                record.numbered(),
                Self::confirm_prompt()
            );
            TurnResult::new(
                TurnStatus::CompleteAwaitingApproval,
                StageRecord::Questions(record),
                reply,
            )
        } else {
            let reply = Self::count_reply(&record);
            TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Questions(record),
                reply,
            )
        }
    }

    fn feedback_turn(
        &self,
        view: &StageView<'_>,
        prior: QuestionsRecord,
        candidate: QuestionsCandidate,
        confidence: Option<f32>,
    ) -> TurnResult {
        if candidate.approved && prior.is_content_complete() {
            if is_low_confidence(confidence) {
                let reply = format!(
                    "Just to confirm before I finalize: do you approve these {} questions as-is?",
                    REQUIRED_QUESTION_COUNT
                );
                return TurnResult::new(
                    TurnStatus::CompleteAwaitingApproval,
                    StageRecord::Questions(prior),
                    reply,
                );
            }

            let mut approved = prior;
            approved.approved = true;
            let jd_title = view
                .approved_description()
                .map(|d| d.title.clone())
                .unwrap_or_default();
            let reply = format!(
                "The screening questions are approved. Final package for \"{}\":\n\n{}\n\nThis concludes the workflow.",
                jd_title,
                approved.numbered()
            );
            return TurnResult::new(
                TurnStatus::Approved,
                StageRecord::Questions(approved),
                reply,
            );
        }

        let merged = prior.merge(&candidate);

        if merged.questions != prior.questions {
            if merged.is_content_complete() {
                let reply = format!(
                    "I've updated the questions:\n\n{}\n\n{}",
                    merged.numbered(),
                    Self::confirm_prompt()
                );
                return TurnResult::new(
                    TurnStatus::CompleteAwaitingApproval,
                    StageRecord::Questions(merged),
                    reply,
                );
            }
            let reply = Self::count_reply(&merged);
            return TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Questions(merged),
                reply,
            );
        }

        if !merged.is_content_complete() {
            let reply = Self::count_reply(&merged);
            return TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Questions(merged),
                reply,
            );
        }

        if !candidate.revision_notes.is_empty() {
            let reply = format!(
                "Understood - you'd like changes: {}. Tell me which questions to adjust and I'll revise the list.",
                candidate.revision_notes.join("; ")
            );
            return TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Questions(merged),
                reply,
            );
        }

        let reply = format!(
            "I wasn't sure whether that was an approval or a change request. {}",
            Self::confirm_prompt()
        );
        TurnResult::new(
            TurnStatus::CompleteAwaitingApproval,
            StageRecord::Questions(merged),
            reply,
        )
    }
}

#[async_trait]
impl StageAgent for QuestionsAgent {
    fn stage(&self) -> Stage {
        Stage::Questions
    }

    async fn process(
        &self,
        view: StageView<'_>,
        user_message: &str,
    ) -> Result<TurnResult, AgentError> {
        let description = view
            .approved_description()
            .ok_or_else(|| WorkflowError::PreconditionViolation {
                stage: Stage::Questions,
                missing: "approved job description".to_string(),
            })?;

        let prior = view.questions().cloned();
        let prior_json = prior
            .as_ref()
            .and_then(|p| serde_json::to_value(p).ok())
            .unwrap_or_else(|| json!({}));
        let context = serde_json::to_value(description).unwrap_or(Value::Null);

        let request = ExtractionRequest::new(questions_schema(), prior_json, user_message)
            .with_context(context);

        match extract_into::<QuestionsCandidate>(self.extractor.as_ref(), request).await? {
            Extraction::Invalid(violations) => {
                let record = prior.unwrap_or_default();
                Ok(TurnResult::new(
                    TurnStatus::Incomplete,
                    StageRecord::Questions(record),
                    format!(
                        "I had trouble reading that ({}). Could you rephrase?",
                        violations
                    ),
                ))
            }
            Extraction::Candidate { value, confidence } => match prior {
                None => Ok(self.first_generation(&value)),
                Some(prior) => Ok(self.feedback_turn(&view, prior, value, confidence)),
            },
        }
    }
}
