//! HandleTurnHandler - Process one user turn against a stored session.
//!
//! The single logical operation the surrounding service calls, independent
//! of its transport: load the session, run the supervisor, persist, reply.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{SessionId, Stage};
use crate::domain::workflow::errors::WorkflowError;
use crate::domain::workflow::supervisor::Supervisor;
use crate::ports::session_store::{SessionStore, SessionStoreError};

/// Command to process one user turn.
#[derive(Debug, Clone)]
pub struct HandleTurnCommand {
    pub session_id: SessionId,
    pub user_message: String,
}

/// Result of a processed turn.
#[derive(Debug, Clone)]
pub struct HandleTurnResult {
    pub reply: String,
    pub stage: Stage,
}

/// Error type for turn handling.
#[derive(Debug, thiserror::Error)]
pub enum HandleTurnError {
    /// The session id is not recognized. Surfaced explicitly; a fresh
    /// session is never started silently in its place.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl From<SessionStoreError> for HandleTurnError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => HandleTurnError::UnknownSession(id),
            other => HandleTurnError::Storage(other.to_string()),
        }
    }
}

/// Per-session async locks.
///
/// Turns for the same session run strictly one at a time so the
/// single-active-stage invariant holds even when the surrounding service
/// overlaps requests; different sessions proceed independently.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn for_session(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        self.inner
            .lock()
            .await
            .entry(session_id)
            .or_default()
            .clone()
    }
}

/// Handler for the `handle_turn` operation.
pub struct HandleTurnHandler {
    store: Arc<dyn SessionStore>,
    supervisor: Arc<Supervisor>,
    locks: SessionLocks,
}

impl HandleTurnHandler {
    pub fn new(store: Arc<dyn SessionStore>, supervisor: Arc<Supervisor>) -> Self {
        Self {
            store,
            supervisor,
            locks: SessionLocks::default(),
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleTurnCommand,
    ) -> Result<HandleTurnResult, HandleTurnError> {
        let lock = self.locks.for_session(cmd.session_id).await;
        let _guard = lock.lock().await;

        // 1. Load the session; an unknown id is a distinct, surfaced error.
        let mut session = self.store.get(cmd.session_id).await?;

        // 2. Run the turn to completion on a working copy of the state.
        let reply = self
            .supervisor
            .handle_turn(&mut session, &cmd.user_message)
            .await?;

        // 3. Persist. Mutations become durable only here: a turn that fails
        //    or is cancelled earlier leaves the stored session pre-turn.
        self.store.put(&session).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            stage = %session.stage,
            "turn handled"
        );

        Ok(HandleTurnResult {
            reply,
            stage: session.stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::extractor::MockExtractor;
    use crate::adapters::store::InMemorySessionStore;
    use crate::domain::workflow::session::WorkflowSession;
    use crate::ports::extractor::{ExtractorError, ExtractorOutput};
    use serde_json::json;

    fn handler_with(
        extractor: MockExtractor,
        store: Arc<InMemorySessionStore>,
    ) -> HandleTurnHandler {
        let supervisor = Arc::new(Supervisor::new(Arc::new(extractor)));
        HandleTurnHandler::new(store, supervisor)
    }

    async fn seed_session(store: &InMemorySessionStore) -> SessionId {
        let session = WorkflowSession::new(SessionId::new());
        let id = session.session_id;
        store.put(&session).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_unknown_session_is_distinct_error() {
        let store = Arc::new(InMemorySessionStore::new());
        let handler = handler_with(MockExtractor::new(), store);

        let result = handler
            .handle(HandleTurnCommand {
                session_id: SessionId::new(),
                user_message: "hello".to_string(),
            })
            .await;

        assert!(matches!(result, Err(HandleTurnError::UnknownSession(_))));
    }

    #[tokio::test]
    async fn test_turn_persists_session_mutation() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = seed_session(&store).await;
        let extractor = MockExtractor::new().with_output(ExtractorOutput::new(
            json!({"company": "Acme", "role_title": "Backend Engineer"}),
        ));
        let handler = handler_with(extractor, store.clone());

        let result = handler
            .handle(HandleTurnCommand {
                session_id: id,
                user_message: "Acme, Backend Engineer".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.stage, Stage::Intent);
        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.history.len(), 2);
        assert_eq!(stored.intent.as_ref().unwrap().company, "Acme");
    }

    #[tokio::test]
    async fn test_extractor_failure_keeps_stored_state_pre_turn() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = seed_session(&store).await;
        let before = store.get(id).await.unwrap();
        let extractor =
            MockExtractor::new().with_error(ExtractorError::unavailable("provider down"));
        let handler = handler_with(extractor, store.clone());

        let result = handler
            .handle(HandleTurnCommand {
                session_id: id,
                user_message: "Hiring at Acme".to_string(),
            })
            .await
            .unwrap();

        assert!(result.reply.contains("again"));
        assert_eq!(store.get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_fatal_workflow_error_not_persisted() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut session = WorkflowSession::new(SessionId::new());
        session.stage = Stage::Questions; // precondition deliberately unsatisfied
        let id = session.session_id;
        store.put(&session).await.unwrap();
        let handler = handler_with(MockExtractor::new(), store.clone());

        let result = handler
            .handle(HandleTurnCommand {
                session_id: id,
                user_message: "generate".to_string(),
            })
            .await;

        assert!(matches!(result, Err(HandleTurnError::Workflow(_))));
        assert_eq!(store.get(id).await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_concurrent_turns_for_one_session_serialize() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = seed_session(&store).await;
        let extractor = MockExtractor::new()
            .with_delay(std::time::Duration::from_millis(20))
            .with_output(ExtractorOutput::new(json!({"company": "Acme"})))
            .with_output(ExtractorOutput::new(json!({"role_title": "Backend Engineer"})));
        let handler = Arc::new(handler_with(extractor, store.clone()));

        let first = handler.handle(HandleTurnCommand {
            session_id: id,
            user_message: "company is Acme".to_string(),
        });
        let second = handler.handle(HandleTurnCommand {
            session_id: id,
            user_message: "role is Backend Engineer".to_string(),
        });
        let (r1, r2) = tokio::join!(first, second);
        r1.unwrap();
        r2.unwrap();

        let stored = store.get(id).await.unwrap();
        // Both turns landed, neither overwrote the other.
        assert_eq!(stored.history.len(), 4);
        let intent = stored.intent.unwrap();
        assert_eq!(intent.company, "Acme");
        assert_eq!(intent.role_title, "Backend Engineer");
    }
}
