//! Adapters: concrete implementations of the ports.

pub mod extractor;
pub mod store;

pub use extractor::{ClaudeExtractor, MockExtractor};
pub use store::InMemorySessionStore;
