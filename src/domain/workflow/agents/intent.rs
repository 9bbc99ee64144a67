//! Intent stage agent: collects the six hiring intent attributes.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::foundation::Stage;
use crate::domain::workflow::errors::AgentError;
use crate::domain::workflow::records::{IntentRecord, StageRecord};
use crate::domain::workflow::schema::intent_schema;
use crate::domain::workflow::turn::{TurnResult, TurnStatus};
use crate::ports::extractor::{ExtractionRequest, StructuredExtractor};

use super::{extract_into, Extraction, StageAgent, StageView};

/// Collects company, role title, skills, experience level, location, and
/// employment type. Complete once all six are filled; there is no separate
/// approval gate on this stage.
pub struct IntentAgent {
    extractor: Arc<dyn StructuredExtractor>,
}

impl IntentAgent {
    pub fn new(extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self { extractor }
    }
}

/// One polite question per missing attribute, asked in collection order.
fn question_for(field: &str) -> &'static str {
    match field {
        "company" => "Which company is this role for?",
        "role title" => "What is the title of the role?",
        "skills" => "Which skills are required for this role?",
        "experience level" => "How much experience should candidates have?",
        "location" => "What is the primary location for this role?",
        "employment type" => "Is this full-time, part-time, or contract?",
        _ => "Could you share the remaining role details?",
    }
}

#[async_trait]
impl StageAgent for IntentAgent {
    fn stage(&self) -> Stage {
        Stage::Intent
    }

    async fn process(
        &self,
        view: StageView<'_>,
        user_message: &str,
    ) -> Result<TurnResult, AgentError> {
        let first_turn = view.intent().is_none();
        let prior = view.intent().cloned().unwrap_or_default();
        let prior_json = serde_json::to_value(&prior).unwrap_or(Value::Null);

        let request = ExtractionRequest::new(intent_schema(), prior_json, user_message);
        match extract_into::<IntentRecord>(self.extractor.as_ref(), request).await? {
            Extraction::Invalid(violations) => Ok(TurnResult::new(
                TurnStatus::Incomplete,
                StageRecord::Intent(prior),
                format!(
                    "I had trouble reading part of that ({}). Could you rephrase?",
                    violations
                ),
            )),
            Extraction::Candidate { value, .. } => {
                let merged = prior.merge(&value);

                if merged.is_complete() {
                    let reply = format!(
                        "Great, I have all the core details:\n\n{}\n\nI'll draft the job description next - send any message to continue.",
                        merged.summary()
                    );
                    return Ok(TurnResult::new(
                        TurnStatus::Approved,
                        StageRecord::Intent(merged),
                        reply,
                    ));
                }

                let missing = merged.missing_fields();
                let question = question_for(missing[0]);
                let reply = if first_turn && merged == IntentRecord::default() {
                    format!(
                        "Hi! I'll help you put this role together. {}",
                        question
                    )
                } else {
                    format!("{}\n\nCollected so far:\n{}", question, merged.summary())
                };

                Ok(TurnResult::new(
                    TurnStatus::Incomplete,
                    StageRecord::Intent(merged),
                    reply,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::extractor::MockExtractor;
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::session::WorkflowSession;
    use crate::ports::extractor::ExtractorOutput;
    use serde_json::json;

    fn session() -> WorkflowSession {
        WorkflowSession::new(SessionId::new())
    }

    fn agent(extractor: MockExtractor) -> IntentAgent {
        IntentAgent::new(Arc::new(extractor))
    }

    #[tokio::test]
    async fn test_complete_extraction_approves_in_one_turn() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(json!({
            "company": "Acme",
            "role_title": "Backend Engineer",
            "skills": ["Python", "AWS"],
            "experience_level": "3 years",
            "location": "Remote",
            "employment_type": "Full-time",
        })));
        let session = session();

        let result = agent(extractor)
            .process(
                StageView::new(&session),
                "Hiring a Backend Engineer at Acme, need Python and AWS, 3 years, remote, full-time",
            )
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Approved);
        let StageRecord::Intent(record) = result.record else {
            panic!("expected intent record");
        };
        assert!(record.is_complete());
    }

    #[tokio::test]
    async fn test_partial_extraction_asks_next_missing_attribute() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(json!({
            "company": "Acme",
            "role_title": "Backend Engineer",
        })));
        let session = session();

        let result = agent(extractor)
            .process(StageView::new(&session), "Acme, Backend Engineer")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Incomplete);
        assert!(result.reply.contains("Which skills are required"));
        let StageRecord::Intent(record) = result.record else {
            panic!("expected intent record");
        };
        assert_eq!(
            record.missing_fields(),
            vec!["skills", "experience level", "location", "employment type"]
        );
    }

    #[tokio::test]
    async fn test_greeting_with_no_fields_stays_incomplete() {
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(json!({})));
        let session = session();

        let result = agent(extractor)
            .process(StageView::new(&session), "hello there")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Incomplete);
        assert!(result.reply.contains("Which company"));
    }

    #[tokio::test]
    async fn test_invalid_extraction_keeps_prior_record() {
        let extractor = MockExtractor::new()
            .with_output(ExtractorOutput::new(json!({"company": 42})));
        let mut session = session();
        session.intent = Some(IntentRecord {
            company: "Acme".to_string(),
            ..Default::default()
        });

        let result = agent(extractor)
            .process(StageView::new(&session), "gibberish")
            .await
            .unwrap();

        assert_eq!(result.status, TurnStatus::Incomplete);
        let StageRecord::Intent(record) = result.record else {
            panic!("expected intent record");
        };
        assert_eq!(record.company, "Acme");
        assert!(result.reply.contains("company"));
    }

    #[tokio::test]
    async fn test_extractor_failure_propagates() {
        let extractor = MockExtractor::new()
            .with_error(crate::ports::extractor::ExtractorError::Timeout { timeout_secs: 5 });
        let session = session();

        let result = agent(extractor)
            .process(StageView::new(&session), "Acme")
            .await;

        assert!(matches!(result, Err(AgentError::Extractor(_))));
    }
}
