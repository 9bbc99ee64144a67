//! Mock extractor for testing.
//!
//! Configurable implementation of the StructuredExtractor port so tests can
//! run without a real LLM.
//!
//! # Features
//!
//! - Pre-configured outputs, consumed in order
//! - Error injection for resilience testing
//! - Simulated latency
//! - Call tracking for verification

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::extractor::{
    ExtractionRequest, ExtractorError, ExtractorOutput, StructuredExtractor,
};

/// A configured mock outcome.
#[derive(Debug, Clone)]
enum MockOutcome {
    Output(ExtractorOutput),
    Error(ExtractorError),
}

/// Scripted extractor: returns queued outputs in order, then echoes the
/// prior record once exhausted.
#[derive(Debug, Clone)]
pub struct MockExtractor {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    calls: Arc<Mutex<Vec<ExtractionRequest>>>,
    delay: Duration,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Queues a successful extraction output.
    pub fn with_output(self, output: ExtractorOutput) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Output(output));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: ExtractorError) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Error(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<ExtractionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredExtractor for MockExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractorOutput, ExtractorError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = self.outcomes.lock().unwrap().pop_front();
        let prior = request.prior_record.clone();
        self.calls.lock().unwrap().push(request);

        match next {
            Some(MockOutcome::Output(output)) => Ok(output),
            Some(MockOutcome::Error(error)) => Err(error),
            // Exhausted: behave as if nothing new was extracted.
            None => Ok(ExtractorOutput::new(prior).with_confidence(1.0)),
        }
    }
}
