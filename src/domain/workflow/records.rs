//! Structured records accumulated by each workflow stage.
//!
//! Each stage owns one record type with its own completeness predicate and
//! an idempotent merge: re-submitting the same message never regresses a
//! filled field to empty and never appends duplicate list entries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Stage;

/// A screening questions record is only complete with exactly this many entries.
pub const REQUIRED_QUESTION_COUNT: usize = 10;

/// Merges a free-text field: a non-empty candidate wins, an empty candidate
/// never erases prior content.
fn merge_text(prior: &str, candidate: &str) -> String {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        prior.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Merges a grow-only list: new entries are appended, case-insensitive
/// duplicates and blanks are dropped.
fn merge_list_union(prior: &[String], candidate: &[String]) -> Vec<String> {
    let mut merged = prior.to_vec();
    for item in candidate {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !merged.iter().any(|e| e.eq_ignore_ascii_case(trimmed)) {
            merged.push(trimmed.to_string());
        }
    }
    merged
}

/// Merges a replace-on-revision list: a non-empty candidate replaces the
/// prior list wholesale, an empty candidate keeps it.
fn merge_list_replace(prior: &[String], candidate: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = candidate
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        prior.to_vec()
    } else {
        cleaned
    }
}

/// Hiring intent collected from the user.
///
/// All six fields are required before the stage is considered complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employment_type: String,
}

impl IntentRecord {
    /// Human-readable labels of the fields still empty, in collection order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.company.trim().is_empty() {
            missing.push("company");
        }
        if self.role_title.trim().is_empty() {
            missing.push("role title");
        }
        if self.skills.is_empty() {
            missing.push("skills");
        }
        if self.experience_level.trim().is_empty() {
            missing.push("experience level");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        if self.employment_type.trim().is_empty() {
            missing.push("employment type");
        }
        missing
    }

    /// True once all six attributes are filled.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Merges extracted candidate data into this record.
    pub fn merge(&self, candidate: &IntentRecord) -> IntentRecord {
        IntentRecord {
            company: merge_text(&self.company, &candidate.company),
            role_title: merge_text(&self.role_title, &candidate.role_title),
            skills: merge_list_union(&self.skills, &candidate.skills),
            experience_level: merge_text(&self.experience_level, &candidate.experience_level),
            location: merge_text(&self.location, &candidate.location),
            employment_type: merge_text(&self.employment_type, &candidate.employment_type),
        }
    }

    /// Renders the collected attributes for a conversational reply.
    pub fn summary(&self) -> String {
        let value = |s: &str| {
            if s.trim().is_empty() {
                "(not provided)".to_string()
            } else {
                s.to_string()
            }
        };
        let skills = if self.skills.is_empty() {
            "(not provided)".to_string()
        } else {
            self.skills.join(", ")
        };
        format!(
            "- Company: {}\n- Role: {}\n- Skills: {}\n- Experience: {}\n- Location: {}\n- Employment type: {}",
            value(&self.company),
            value(&self.role_title),
            skills,
            value(&self.experience_level),
            value(&self.location),
            value(&self.employment_type),
        )
    }
}

/// Job description draft plus its approval flag.
///
/// `approved` is never set by content merging; only an explicit approval
/// classification flips it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub approved: bool,
}

impl DescriptionRecord {
    /// Labels of content fields still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.summary.trim().is_empty() {
            missing.push("summary");
        }
        if self.responsibilities.is_empty() {
            missing.push("responsibilities");
        }
        if self.qualifications.is_empty() {
            missing.push("qualifications");
        }
        missing
    }

    /// True once every content field is filled; says nothing about approval.
    pub fn is_content_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Merges extracted candidate content; the approval flag is untouched.
    pub fn merge(&self, candidate: &DescriptionCandidate) -> DescriptionRecord {
        DescriptionRecord {
            title: merge_text(&self.title, &candidate.title),
            summary: merge_text(&self.summary, &candidate.summary),
            responsibilities: merge_list_replace(&self.responsibilities, &candidate.responsibilities),
            qualifications: merge_list_replace(&self.qualifications, &candidate.qualifications),
            approved: self.approved,
        }
    }

    /// Names the content fields whose values differ from `other`.
    pub fn changed_fields(&self, other: &DescriptionRecord) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.title != other.title {
            changed.push("title");
        }
        if self.summary != other.summary {
            changed.push("summary");
        }
        if self.responsibilities != other.responsibilities {
            changed.push("responsibilities");
        }
        if self.qualifications != other.qualifications {
            changed.push("qualifications");
        }
        changed
    }

    /// Renders the draft for a conversational reply.
    pub fn render(&self) -> String {
        let bullets = |items: &[String]| {
            items
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "# {}\n\n{}\n\n## Key Responsibilities\n{}\n\n## Qualifications\n{}",
            self.title,
            self.summary,
            bullets(&self.responsibilities),
            bullets(&self.qualifications),
        )
    }
}

/// Candidate description produced by the extractor for one turn.
///
/// Carries the approval classification and any revision requests alongside
/// the content fields; only the content participates in merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptionCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub revision_notes: Vec<String>,
}

/// Screening questions plus their approval flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionsRecord {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub approved: bool,
}

impl QuestionsRecord {
    /// True with exactly the required number of non-empty questions.
    pub fn is_content_complete(&self) -> bool {
        self.questions.len() == REQUIRED_QUESTION_COUNT
            && self.questions.iter().all(|q| !q.trim().is_empty())
    }

    /// Merges an extracted candidate list; a non-empty revision replaces the
    /// prior list, the approval flag is untouched.
    pub fn merge(&self, candidate: &QuestionsCandidate) -> QuestionsRecord {
        QuestionsRecord {
            questions: merge_list_replace(&self.questions, &candidate.questions),
            approved: self.approved,
        }
    }

    /// Renders the questions as a numbered list.
    pub fn numbered(&self) -> String {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Candidate question list produced by the extractor for one turn.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionsCandidate {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub revision_notes: Vec<String>,
}

/// The record a stage agent hands back to the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageRecord {
    Intent(IntentRecord),
    Description(DescriptionRecord),
    Questions(QuestionsRecord),
}

impl StageRecord {
    /// The stage this record belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            StageRecord::Intent(_) => Stage::Intent,
            StageRecord::Description(_) => Stage::Description,
            StageRecord::Questions(_) => Stage::Questions,
        }
    }
}
