//! Workflow Session Entity
//!
//! The single mutable state container threaded through every turn: current
//! stage, accumulated records per stage, approval flags, and conversation
//! history. Owned exclusively by the supervisor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::{SessionId, Stage};
use crate::domain::workflow::records::{DescriptionRecord, IntentRecord, QuestionsRecord};
use crate::domain::workflow::turn::{Speaker, TurnEntry};

/// Complete state of one hiring workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSession {
    pub session_id: SessionId,
    pub stage: Stage,
    pub intent: Option<IntentRecord>,
    pub description: Option<DescriptionRecord>,
    pub questions: Option<QuestionsRecord>,
    /// Stages the human has explicitly approved.
    pub approvals: HashSet<Stage>,
    /// Append-only conversation history.
    pub history: Vec<TurnEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowSession {
    /// Creates a fresh session at the Intent stage.
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            stage: Stage::Intent,
            intent: None,
            description: None,
            questions: None,
            approvals: HashSet::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends one user entry and one assistant entry for a resolved turn.
    pub fn record_turn(&mut self, user_text: &str, reply: &str) {
        self.history.push(TurnEntry::new(Speaker::User, user_text));
        self.history.push(TurnEntry::new(Speaker::Assistant, reply));
        self.updated_at = Utc::now();
    }

    /// Marks a stage as explicitly human-approved.
    pub fn approve(&mut self, stage: Stage) {
        self.approvals.insert(stage);
        self.updated_at = Utc::now();
    }

    /// Revokes a stage approval when the user requests revision.
    pub fn revoke_approval(&mut self, stage: Stage) {
        self.approvals.remove(&stage);
        self.updated_at = Utc::now();
    }

    /// True when the given stage carries an explicit approval.
    pub fn is_approved(&self, stage: Stage) -> bool {
        self.approvals.contains(&stage)
    }

    /// Advances to the next stage in the fixed order.
    ///
    /// Stages only ever move forward one step; calling this at End is a
    /// routing defect and returns the terminal stage unchanged.
    pub fn advance_stage(&mut self) -> Stage {
        if let Some(next) = self.stage.next() {
            self.stage = next;
            self.updated_at = Utc::now();
        }
        self.stage
    }

    /// The intent record, only if the human approved the Intent stage.
    pub fn approved_intent(&self) -> Option<&IntentRecord> {
        if self.is_approved(Stage::Intent) {
            self.intent.as_ref()
        } else {
            None
        }
    }

    /// The description record, only if the human approved the Description stage.
    pub fn approved_description(&self) -> Option<&DescriptionRecord> {
        if self.is_approved(Stage::Description) {
            self.description.as_ref()
        } else {
            None
        }
    }
}
