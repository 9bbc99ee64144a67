//! Extractor adapters.

mod claude;
mod mock;

pub use claude::{ClaudeExtractor, ClaudeExtractorConfig};
pub use mock::MockExtractor;
