//! In-Memory Session Store Adapter
//!
//! Keeps workflow sessions in a process-local map. Useful for testing and
//! single-instance development; production deployments plug in their own
//! store behind the same port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::workflow::session::WorkflowSession;
use crate::ports::session_store::{SessionStore, SessionStoreError};

/// In-memory storage for workflow sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, WorkflowSession>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored sessions (useful for tests).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: SessionId) -> Result<WorkflowSession, SessionStoreError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionStoreError::NotFound(session_id))
    }

    async fn put(&self, session: &WorkflowSession) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn exists(&self, session_id: SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.read().await.contains_key(&session_id))
    }

    async fn remove(&self, session_id: SessionId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }
}
