//! Session Store Port - Interface for loading and saving workflow sessions.
//!
//! Persistence mechanism, expiry, and multi-instance consistency are the
//! surrounding service's concern; the core only needs get/put keyed by
//! session id.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::workflow::session::WorkflowSession;

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("failed to serialize session: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Port for persisting and loading workflow sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session.
    ///
    /// # Errors
    /// Returns `SessionStoreError::NotFound` if no session exists for the id.
    async fn get(&self, session_id: SessionId) -> Result<WorkflowSession, SessionStoreError>;

    /// Saves a session, replacing any previous state for its id.
    async fn put(&self, session: &WorkflowSession) -> Result<(), SessionStoreError>;

    /// Checks whether a session exists.
    async fn exists(&self, session_id: SessionId) -> Result<bool, SessionStoreError>;

    /// Removes a session.
    async fn remove(&self, session_id: SessionId) -> Result<(), SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_session() {
        let id = SessionId::new();
        let err = SessionStoreError::NotFound(id);

        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_backend_error_display() {
        let err = SessionStoreError::Backend("connection refused".to_string());

        assert!(err.to_string().contains("connection refused"));
    }
}
