//! StartSessionHandler - Create a fresh workflow session.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::workflow::session::WorkflowSession;
use crate::ports::session_store::{SessionStore, SessionStoreError};

/// Opening message for a new session.
const GREETING: &str = "Hi! I can help you define a role, draft its job description, and \
                        prepare screening questions. Tell me about the position you're hiring for.";

/// Command to start a session. A caller-supplied id is used as-is; otherwise
/// a fresh one is generated.
#[derive(Debug, Clone, Default)]
pub struct StartSessionCommand {
    pub session_id: Option<SessionId>,
}

/// Result of starting a session.
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session_id: SessionId,
    pub greeting: String,
}

/// Error type for session creation.
#[derive(Debug, thiserror::Error)]
pub enum StartSessionError {
    #[error("session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<SessionStoreError> for StartSessionError {
    fn from(err: SessionStoreError) -> Self {
        StartSessionError::Storage(err.to_string())
    }
}

/// Handler for the `start_session` operation.
pub struct StartSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl StartSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: StartSessionCommand,
    ) -> Result<StartSessionResult, StartSessionError> {
        let session_id = cmd.session_id.unwrap_or_default();

        if self.store.exists(session_id).await? {
            return Err(StartSessionError::AlreadyExists(session_id));
        }

        let session = WorkflowSession::new(session_id);
        self.store.put(&session).await?;

        tracing::info!(session_id = %session_id, "session started");

        Ok(StartSessionResult {
            session_id,
            greeting: GREETING.to_string(),
        })
    }
}
