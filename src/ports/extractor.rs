//! Structured Extractor Port - Interface to the text-understanding capability.
//!
//! The core hands the extractor a schema descriptor, the record accumulated
//! so far, and the user's latest message, and expects back a candidate
//! record as JSON. The underlying capability may be stochastic; the domain
//! type-checks every response against the schema before accepting it.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::workflow::schema::SchemaDescriptor;

/// Port for structured extraction from free text.
///
/// Implementations call out to an LLM (or return scripted data in tests)
/// and translate provider responses into [`ExtractorOutput`].
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Produces a candidate record for one user turn.
    ///
    /// Must resolve (success or failure) before the caller applies any
    /// session mutation for the turn.
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractorOutput, ExtractorError>;
}

/// One extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Target schema the candidate record must conform to.
    pub schema: SchemaDescriptor,
    /// Record accumulated over prior turns (JSON object, possibly empty).
    pub prior_record: Value,
    /// The user's latest message.
    pub user_text: String,
    /// Read-only upstream context, e.g. the approved intent when drafting a
    /// job description. Null when the stage has no upstream dependency.
    pub context: Value,
}

impl ExtractionRequest {
    /// Creates a request with no upstream context.
    pub fn new(schema: SchemaDescriptor, prior_record: Value, user_text: impl Into<String>) -> Self {
        Self {
            schema,
            prior_record,
            user_text: user_text.into(),
            context: Value::Null,
        }
    }

    /// Attaches upstream context from an earlier approved stage.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Result of a successful extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorOutput {
    /// Candidate record as a JSON object; validated by the caller.
    pub record: Value,
    /// Self-reported confidence in [0, 1], if the capability provides one.
    pub confidence: Option<f32>,
}

impl ExtractorOutput {
    pub fn new(record: Value) -> Self {
        Self {
            record,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Extractor failures.
///
/// All variants are recoverable at the workflow level: the turn becomes
/// incomplete and the user is asked to resend. Retry policy lives in the
/// adapter.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ExtractorError {
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("capability unavailable: {message}")]
    Unavailable { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse capability response: {0}")]
    Parse(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl ExtractorError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if the adapter may retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractorError::RateLimited { .. }
                | ExtractorError::Unavailable { .. }
                | ExtractorError::Network(_)
                | ExtractorError::Timeout { .. }
        )
    }
}
