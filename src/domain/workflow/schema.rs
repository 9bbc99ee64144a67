//! Extraction schemas for each workflow stage.
//!
//! A schema descriptor is handed to the extractor so it knows which fields
//! to produce, and is used afterwards to type-check the extractor's output
//! before anything is merged. Validation is deterministic even though the
//! extractor itself is not.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::Stage;
use crate::domain::workflow::records::REQUIRED_QUESTION_COUNT;

/// Schema describing the structured output expected from the extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDescriptor {
    pub stage: Stage,
    pub fields: Vec<SchemaField>,
}

/// A field in an extraction schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    /// Required for the stage to be considered content-complete. Presence in
    /// any single extractor response is not enforced; records accumulate.
    pub required: bool,
    pub description: String,
}

/// Field types in extraction schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Boolean,
    TextList,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::TextList => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
        }
    }

    /// Human-readable type name used in extractor prompts.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Boolean => "boolean",
            FieldType::TextList => "list of strings",
        }
    }
}

/// Fields of an extractor response that failed type validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaViolations {
    pub invalid: Vec<String>,
}

impl SchemaViolations {
    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid fields: {}", self.invalid.join(", "))
    }
}

impl SchemaDescriptor {
    /// Type-checks an extractor response against this schema.
    ///
    /// Fields absent from the response are fine (records accumulate over
    /// turns); present fields with the wrong type, or a non-object response,
    /// are violations. Unknown fields are ignored.
    pub fn validate(&self, record: &Value) -> Result<(), SchemaViolations> {
        let Some(object) = record.as_object() else {
            return Err(SchemaViolations {
                invalid: vec!["(response is not an object)".to_string()],
            });
        };

        let mut violations = SchemaViolations::default();
        for field in &self.fields {
            if let Some(value) = object.get(&field.name) {
                if !value.is_null() && !field.field_type.matches(value) {
                    violations.invalid.push(field.name.clone());
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Renders the schema as a field list for extractor prompts.
    pub fn prompt_fields(&self) -> String {
        self.fields
            .iter()
            .map(|f| {
                format!(
                    "- \"{}\" ({}): {}",
                    f.name,
                    f.field_type.prompt_name(),
                    f.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Schema for the hiring intent stage.
pub fn intent_schema() -> SchemaDescriptor {
    SchemaDescriptor {
        stage: Stage::Intent,
        fields: vec![
            SchemaField {
                name: "company".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Name of the hiring company".to_string(),
            },
            SchemaField {
                name: "role_title".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Title of the role being hired for".to_string(),
            },
            SchemaField {
                name: "skills".to_string(),
                field_type: FieldType::TextList,
                required: true,
                description: "Required skills, one entry per skill".to_string(),
            },
            SchemaField {
                name: "experience_level".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Expected experience level or years".to_string(),
            },
            SchemaField {
                name: "location".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Primary location, or remote".to_string(),
            },
            SchemaField {
                name: "employment_type".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Full-time, part-time, or contract".to_string(),
            },
        ],
    }
}

/// Schema for the job description stage.
pub fn description_schema() -> SchemaDescriptor {
    SchemaDescriptor {
        stage: Stage::Description,
        fields: vec![
            SchemaField {
                name: "title".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Job title for the posting".to_string(),
            },
            SchemaField {
                name: "summary".to_string(),
                field_type: FieldType::Text,
                required: true,
                description: "Engaging role and company summary paragraph".to_string(),
            },
            SchemaField {
                name: "responsibilities".to_string(),
                field_type: FieldType::TextList,
                required: true,
                description: "Key responsibilities as bullet points".to_string(),
            },
            SchemaField {
                name: "qualifications".to_string(),
                field_type: FieldType::TextList,
                required: true,
                description: "Required skills and qualifications as bullet points".to_string(),
            },
            SchemaField {
                name: "approved".to_string(),
                field_type: FieldType::Boolean,
                required: false,
                description: "True only when the user clearly approves the current draft"
                    .to_string(),
            },
            SchemaField {
                name: "revision_notes".to_string(),
                field_type: FieldType::TextList,
                required: false,
                description: "Changes the user asked for, empty if none".to_string(),
            },
        ],
    }
}

/// Schema for the screening questions stage.
pub fn questions_schema() -> SchemaDescriptor {
    SchemaDescriptor {
        stage: Stage::Questions,
        fields: vec![
            SchemaField {
                name: "questions".to_string(),
                field_type: FieldType::TextList,
                required: true,
                description: format!(
                    "Exactly {} technical screening questions derived from the job description",
                    REQUIRED_QUESTION_COUNT
                ),
            },
            SchemaField {
                name: "approved".to_string(),
                field_type: FieldType::Boolean,
                required: false,
                description: "True only when the user clearly approves the current questions"
                    .to_string(),
            },
            SchemaField {
                name: "revision_notes".to_string(),
                field_type: FieldType::TextList,
                required: false,
                description: "Changes the user asked for, empty if none".to_string(),
            },
        ],
    }
}
