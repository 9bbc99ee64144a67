//! Turn value objects.
//!
//! A turn is one user message and the resulting reply, processed atomically
//! with respect to session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::workflow::records::StageRecord;

/// Outcome status a stage agent reports for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The stage still needs information or revisions.
    Incomplete,
    /// Content is complete but the human has not approved it yet.
    CompleteAwaitingApproval,
    /// The human explicitly approved; the supervisor may advance.
    Approved,
}

/// What a stage agent returns for one processed turn.
///
/// Transient: its effect is persisted only once the supervisor commits it
/// into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub status: TurnStatus,
    pub record: StageRecord,
    pub reply: String,
}

impl TurnResult {
    pub fn new(status: TurnStatus, record: StageRecord, reply: impl Into<String>) -> Self {
        Self {
            status,
            record,
            reply: reply.into(),
        }
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry in a session's append-only conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::records::IntentRecord;

    #[test]
    fn test_turn_status_serde_snake_case() {
        let json = serde_json::to_string(&TurnStatus::CompleteAwaitingApproval).unwrap();
        assert_eq!(json, "\"complete_awaiting_approval\"");
    }

    #[test]
    fn test_turn_result_carries_reply() {
        let result = TurnResult::new(
            TurnStatus::Incomplete,
            StageRecord::Intent(IntentRecord::default()),
            "What is the company name?",
        );

        assert_eq!(result.status, TurnStatus::Incomplete);
        assert_eq!(result.reply, "What is the company name?");
    }

    #[test]
    fn test_turn_entry_records_speaker_and_text() {
        let entry = TurnEntry::new(Speaker::User, "hello");

        assert_eq!(entry.speaker, Speaker::User);
        assert_eq!(entry.text, "hello");
    }
}
