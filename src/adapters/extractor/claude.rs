//! Claude Extractor - StructuredExtractor implementation over the Anthropic
//! messages API.
//!
//! Builds an extraction prompt from the schema descriptor, the accumulated
//! record, and any upstream context, and asks the model for a single JSON
//! object. Responses are parsed tolerantly (markdown code fences, leading
//! prose) but the domain still type-checks the result afterwards.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ClaudeExtractorConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let extractor = ClaudeExtractor::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::extractor::{
    ExtractionRequest, ExtractorError, ExtractorOutput, StructuredExtractor,
};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Output token budget for an extraction response.
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Base delay between retries; multiplied by the attempt number.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Configuration for the Claude extractor.
#[derive(Debug, Clone)]
pub struct ClaudeExtractorConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl ClaudeExtractorConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Builds adapter configuration from the application's extractor settings.
    pub fn from_app_config(
        config: &crate::config::ExtractorConfig,
    ) -> Result<Self, crate::config::ValidationError> {
        config.validate()?;
        Ok(Self::new(config.api_key.clone().unwrap_or_default())
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout())
            .with_max_retries(config.max_retries))
    }
}

/// StructuredExtractor backed by Claude.
pub struct ClaudeExtractor {
    config: ClaudeExtractorConfig,
    client: Client,
}

impl ClaudeExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ClaudeExtractorConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn build_body(&self, request: &ExtractionRequest) -> MessagesRequest {
        let system = format!(
            "You maintain a structured record for a hiring workflow. Merge the user's \
             latest message into the current record.\n\nRecord fields:\n{}\n\nRules:\n\
             - Never invent values the user did not provide.\n\
             - Never replace a filled field with an empty value.\n\
             - Respond with a single JSON object of the form \
             {{\"record\": {{...}}, \"confidence\": <number between 0 and 1>}} and nothing else.",
            request.schema.prompt_fields()
        );

        let mut user = format!("Current record:\n{}\n", request.prior_record);
        if !request.context.is_null() {
            user.push_str(&format!("\nContext from earlier stages:\n{}\n", request.context));
        }
        user.push_str(&format!("\nUser message:\n{}", request.user_text));

        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            system,
            messages: vec![WireMessage {
                role: "user",
                content: user,
            }],
        }
    }

    async fn request_once(&self, body: &MessagesRequest) -> Result<ExtractorOutput, ExtractorError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractorError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else {
                    ExtractorError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, &response));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ExtractorError::parse(e.to_string()))?;
        let text = parsed
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default();

        parse_output(text)
    }

    fn error_for_status(status: StatusCode, response: &reqwest::Response) -> ExtractorError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExtractorError::AuthenticationFailed,
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30);
                ExtractorError::RateLimited { retry_after_secs }
            }
            s if s.is_server_error() => {
                ExtractorError::unavailable(format!("provider returned {}", s))
            }
            s => ExtractorError::network(format!("unexpected status {}", s)),
        }
    }
}

#[async_trait]
impl StructuredExtractor for ClaudeExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractorOutput, ExtractorError> {
        let body = self.build_body(&request);

        let mut attempt: u32 = 0;
        loop {
            match self.request_once(&body).await {
                Ok(output) => return Ok(output),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "extraction call failed, retrying");
                    sleep(RETRY_BASE_DELAY * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parses the model's text into an extractor output.
///
/// Accepts either `{"record": {...}, "confidence": 0.9}` or a bare record
/// object, with or without markdown fencing.
fn parse_output(text: &str) -> Result<ExtractorOutput, ExtractorError> {
    let json_str = extract_json(text);
    let value: Value =
        serde_json::from_str(&json_str).map_err(|e| ExtractorError::parse(e.to_string()))?;

    if let Some(object) = value.as_object() {
        if let Some(record) = object.get("record") {
            let confidence = object
                .get("confidence")
                .and_then(Value::as_f64)
                .map(|c| c as f32);
            return Ok(ExtractorOutput {
                record: record.clone(),
                confidence,
            });
        }
    }

    Ok(ExtractorOutput::new(value))
}

/// Pulls the JSON payload out of a response that may wrap it in a code fence
/// or surround it with prose.
fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    for pattern in ["```json", "```"] {
        if let Some(start) = trimmed.find(pattern) {
            let rest = &trimmed[start + pattern.len()..];
            if let Some(end) = rest.find("```") {
                return rest[..end].trim().to_string();
            }
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(json) = balanced_object(trimmed, start) {
            return json;
        }
    }

    trimmed.to_string()
}

/// Extracts a brace-balanced object starting at `start`, respecting strings.
fn balanced_object(s: &str, start: usize) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + i + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::schema::intent_schema;
    use serde_json::json;

    #[test]
    fn test_parse_output_with_record_envelope() {
        let output =
            parse_output(r#"{"record": {"company": "Acme"}, "confidence": 0.85}"#).unwrap();

        assert_eq!(output.record["company"], "Acme");
        assert_eq!(output.confidence, Some(0.85));
    }

    #[test]
    fn test_parse_output_bare_record() {
        let output = parse_output(r#"{"company": "Acme"}"#).unwrap();

        assert_eq!(output.record["company"], "Acme");
        assert_eq!(output.confidence, None);
    }

    #[test]
    fn test_parse_output_rejects_non_json() {
        assert!(parse_output("definitely not json").is_err());
    }

    #[test]
    fn test_extract_json_from_code_fence() {
        let text = "Here you go:\n```json\n{\"record\": {}}\n```";

        assert_eq!(extract_json(text), "{\"record\": {}}");
    }

    #[test]
    fn test_extract_json_from_surrounding_prose() {
        let text = "The record is {\"company\": \"Acme\"} as requested.";

        assert_eq!(extract_json(text), "{\"company\": \"Acme\"}");
    }

    #[test]
    fn test_extract_json_respects_braces_in_strings() {
        let text = r#"{"summary": "use {curly} braces"} trailing"#;

        let extracted = extract_json(text);
        let value: Value = serde_json::from_str(&extracted).unwrap();

        assert_eq!(value["summary"], "use {curly} braces");
    }

    #[test]
    fn test_build_body_includes_schema_and_context() {
        let extractor = ClaudeExtractor::new(ClaudeExtractorConfig::new("sk-test"));
        let request = ExtractionRequest::new(intent_schema(), json!({}), "hiring at Acme")
            .with_context(json!({"title": "Backend Engineer"}));

        let body = extractor.build_body(&request);

        assert!(body.system.contains("\"company\" (string)"));
        assert!(body.messages[0].content.contains("Backend Engineer"));
        assert!(body.messages[0].content.contains("hiring at Acme"));
    }

    #[test]
    fn test_from_app_config_maps_settings() {
        let app = crate::config::ExtractorConfig {
            api_key: Some("sk-ant-test".to_string()),
            model: "claude-3-haiku-20240307".to_string(),
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 5,
            max_retries: 2,
        };

        let config = ClaudeExtractorConfig::from_app_config(&app).unwrap();

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_from_app_config_rejects_missing_key() {
        let app = crate::config::ExtractorConfig::default();

        assert!(ClaudeExtractorConfig::from_app_config(&app).is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = ClaudeExtractorConfig::new("sk-test")
            .with_model("claude-3-haiku-20240307")
            .with_base_url("http://localhost:8080")
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(1);

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 1);
    }
}
