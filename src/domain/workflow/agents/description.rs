//! Description stage agent: drafts and revises the job description.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::foundation::Stage;
use crate::domain::workflow::errors::{AgentError, WorkflowError};
use crate::domain::workflow::records::{DescriptionCandidate, DescriptionRecord, StageRecord};
use crate::domain::workflow::schema::description_schema;
use crate::domain::workflow::turn::{TurnResult, TurnStatus};
use crate::ports::extractor::{ExtractionRequest, StructuredExtractor};

use super::{extract_into, is_low_confidence, Extraction, StageAgent, StageView};

/// Drafts a job description grounded in the approved intent, then runs the
/// confirm/revise loop until the human approves.
///
/// Requires the approved intent record; being dispatched without one is a
/// routing defect.
pub struct DescriptionAgent {
    extractor: Arc<dyn StructuredExtractor>,
}

impl DescriptionAgent {
    pub fn new(extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self { extractor }
    }

    fn confirm_prompt() -> &'static str {
        "Would you like any changes, or shall I lock this in? (approve / request changes)"
    }

    fn initial_draft(&self, candidate: &DescriptionCandidate) -> TurnResult {
        let draft = DescriptionRecord::default().merge(candidate);

        if draft.is_content_complete() {
            let reply = format!(
                "Here is a draft job description:\n\n{}\n\n{}",
                draft.render(),
                Self::confirm_prompt()
            );
            TurnResult::new(
                TurnStatus::CompleteAwaitingApproval,
                StageRecord::Description(draft),
                reply,
            )
        } else {
            let missing = draft.missing_fields().join(", ");
            let reply = format!(
                "I couldn't produce a complete draft yet (still missing: {}). Could you add a little more detail, or ask me to try again?",
                missing
            );
            TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Description(draft),
                reply,
            )
        }
    }

    fn feedback_turn(
        &self,
        prior: DescriptionRecord,
        candidate: DescriptionCandidate,
        confidence: Option<f32>,
    ) -> TurnResult {
        if candidate.approved {
            if is_low_confidence(confidence) {
                let reply = format!(
                    "Just to confirm before I lock it in: do you approve this job description as-is? {}",
                    Self::confirm_prompt()
                );
                return TurnResult::new(
                    TurnStatus::CompleteAwaitingApproval,
                    StageRecord::Description(prior),
                    reply,
                );
            }

            let mut approved = prior;
            approved.approved = true;
            return TurnResult::new(
                TurnStatus::Approved,
                StageRecord::Description(approved),
                "The job description is approved. Next up: screening questions - send any message to continue.",
            );
        }

        let merged = prior.merge(&candidate);
        let changed = prior.changed_fields(&merged);

        if !changed.is_empty() {
            // Edits applied; surface what moved and return to confirmation.
            if merged.is_content_complete() {
                let reply = format!(
                    "I've updated the {}:\n\n{}\n\n{}",
                    changed.join(", "),
                    merged.render(),
                    Self::confirm_prompt()
                );
                return TurnResult::new(
                    TurnStatus::CompleteAwaitingApproval,
                    StageRecord::Description(merged),
                    reply,
                );
            }
            let missing = merged.missing_fields().join(", ");
            return TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Description(merged),
                format!("I've applied your changes, but the draft is now missing: {}. What should go there?", missing),
            );
        }

        if !candidate.revision_notes.is_empty() {
            let reply = format!(
                "Understood - you'd like changes: {}. Tell me exactly what to update and I'll revise the draft.",
                candidate.revision_notes.join("; ")
            );
            return TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Description(merged),
                reply,
            );
        }

        // Neither a clear approval nor a concrete edit.
        let reply = format!(
            "I wasn't sure whether that was an approval or a change request. {}",
            Self::confirm_prompt()
        );
        TurnResult::new(
            TurnStatus::CompleteAwaitingApproval,
            StageRecord::Description(merged),
            reply,
        )
    }
}

#[async_trait]
impl StageAgent for DescriptionAgent {
    fn stage(&self) -> Stage {
        Stage::Description
    }

    async fn process(
        &self,
        view: StageView<'_>,
        user_message: &str,
    ) -> Result<TurnResult, AgentError> {
        let intent = view
            .approved_intent()
            .ok_or_else(|| WorkflowError::PreconditionViolation {
                stage: Stage::Description,
                missing: "approved hiring intent".to_string(),
            })?;

        let prior = view.description().cloned();
        let prior_json = prior
            .as_ref()
            .and_then(|p| serde_json::to_value(p).ok())
            .unwrap_or_else(|| json!({}));
        let context = serde_json::to_value(intent).unwrap_or(Value::Null);

        let request = ExtractionRequest::new(description_schema(), prior_json, user_message)
            .with_context(context);

        match extract_into::<DescriptionCandidate>(self.extractor.as_ref(), request).await? {
            Extraction::Invalid(violations) => {
                let record = prior.unwrap_or_default();
                Ok(TurnResult::new(
                    TurnStatus::Incomplete,
                    StageRecord::Description(record),
                    format!(
                        "I had trouble reading that ({}). Could you rephrase?",
                        violations
                    ),
                ))
            }
            Extraction::Candidate { value, confidence } => match prior {
                None => Ok(self.initial_draft(&value)),
                Some(prior) => Ok(self.feedback_turn(prior, value, confidence)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::extractor::MockExtractor;
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::records::IntentRecord;
    use crate::domain::workflow::session::WorkflowSession;
    use crate::ports::extractor::ExtractorOutput;

    fn full_intent() -> IntentRecord {
        IntentRecord {
            company: "Acme".to_string(),
            role_title: "Backend Engineer".to_string(),
            skills: vec!["Python".to_string(), "AWS".to_string()],
            experience_level: "3 years".to_string(),
            location: "Remote".to_string(),
            employment_type: "Full-time".to_string(),
        }
    }

    fn session_with_approved_intent() -> WorkflowSession {
        let mut session = WorkflowSession::new(SessionId::new());
        session.intent = Some(full_intent());
        session.approve(Stage::Intent);
        session.stage = Stage::Description;
        session
    }

    fn draft_json() -> Value {
        json!({
            "title": "Backend Engineer",
            "summary": "Acme is looking for a backend engineer to build cloud services.",
            "responsibilities": ["Design APIs", "Operate AWS workloads"],
            "qualifications": ["3+ years with Python", "AWS experience"],
            "approved": false,
            "revision_notes": [],
        })
    }

    fn agent(extractor: MockExtractor) -> DescriptionAgent {
        DescriptionAgent::new(Arc::new(extractor))
    }

    #[tokio::test]
    async fn test_missing_approved_intent_is_precondition_violation() {
        let session = WorkflowSession::new(SessionId::new());
        let extractor = MockExtractor::new();

        let result = agent(extractor)
            .process(StageView::new(&session), "draft it")
            .await;

        assert!(matches!(
            result,
            Err(AgentError::Workflow(WorkflowError::PreconditionViolation {
                stage: Stage::Description,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_first_turn_produces_draft_awaiting_approval() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(draft_json()));
        let session = session_with_approved_intent();

        let result = agent(extractor)
            .process(StageView::new(&session), "go ahead")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::CompleteAwaitingApproval);
        let StageRecord::Description(record) = result.record else {
            panic!("expected description record");
        };
        assert!(record.is_content_complete());
        assert!(!record.approved);
        assert!(result.reply.contains("Backend Engineer"));
    }

    #[tokio::test]
    async fn test_clear_approval_flips_flag_and_approves() {
        let extractor = MockExtractor::new().with_output(
            ExtractorOutput::new(json!({"approved": true})).with_confidence(0.95),
        );
        let mut session = session_with_approved_intent();
        session.description = Some(DescriptionRecord {
            title: "Backend Engineer".to_string(),
            summary: "A role".to_string(),
            responsibilities: vec!["Build".to_string()],
            qualifications: vec!["Python".to_string()],
            approved: false,
        });

        let result = agent(extractor)
            .process(StageView::new(&session), "looks good")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Approved);
        let StageRecord::Description(record) = result.record else {
            panic!("expected description record");
        };
        assert!(record.approved);
    }

    #[tokio::test]
    async fn test_low_confidence_approval_asks_to_clarify() {
        let extractor = MockExtractor::new().with_output(
            ExtractorOutput::new(json!({"approved": true})).with_confidence(0.2),
        );
        let mut session = session_with_approved_intent();
        session.description = Some(DescriptionRecord {
            title: "Backend Engineer".to_string(),
            summary: "A role".to_string(),
            responsibilities: vec!["Build".to_string()],
            qualifications: vec!["Python".to_string()],
            approved: false,
        });

        let result = agent(extractor)
            .process(StageView::new(&session), "yeah I guess maybe")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::CompleteAwaitingApproval);
        let StageRecord::Description(record) = result.record else {
            panic!("expected description record");
        };
        assert!(!record.approved, "low confidence must not approve");
        assert!(result.reply.contains("confirm"));
    }

    #[tokio::test]
    async fn test_revision_surfaces_changed_fields() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(json!({
            "title": "Senior Backend Engineer",
            "approved": false,
            "revision_notes": ["make the title senior"],
        })));
        let mut session = session_with_approved_intent();
        session.description = Some(DescriptionRecord {
            title: "Backend Engineer".to_string(),
            summary: "A role".to_string(),
            responsibilities: vec!["Build".to_string()],
            qualifications: vec!["Python".to_string()],
            approved: false,
        });

        let result = agent(extractor)
            .process(StageView::new(&session), "change the title to Senior")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::CompleteAwaitingApproval);
        assert!(result.reply.contains("updated the title"));
        let StageRecord::Description(record) = result.record else {
            panic!("expected description record");
        };
        assert_eq!(record.title, "Senior Backend Engineer");
        assert_eq!(record.summary, "A role");
    }

    #[tokio::test]
    async fn test_revision_request_without_edits_asks_for_specifics() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(json!({
            "approved": false,
            "revision_notes": ["wants changes"],
        })));
        let mut session = session_with_approved_intent();
        session.description = Some(DescriptionRecord {
            title: "Backend Engineer".to_string(),
            summary: "A role".to_string(),
            responsibilities: vec!["Build".to_string()],
            qualifications: vec!["Python".to_string()],
            approved: false,
        });

        let result = agent(extractor)
            .process(StageView::new(&session), "yes I want changes")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Incomplete);
        assert!(result.reply.contains("what to update"));
    }
}
