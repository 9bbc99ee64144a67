//! Workflow core: session state, stage agents, and the supervisor.

pub mod agents;
pub mod errors;
pub mod records;
pub mod schema;
pub mod session;
pub mod supervisor;
pub mod turn;

pub use agents::{DescriptionAgent, IntentAgent, QuestionsAgent, StageAgent, StageView};
pub use errors::{AgentError, WorkflowError};
pub use records::{
    DescriptionRecord, IntentRecord, QuestionsRecord, StageRecord, REQUIRED_QUESTION_COUNT,
};
pub use schema::{intent_schema, description_schema, questions_schema, SchemaDescriptor};
pub use session::WorkflowSession;
pub use supervisor::Supervisor;
pub use turn::{Speaker, TurnEntry, TurnResult, TurnStatus};
