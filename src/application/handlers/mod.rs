//! Operation handlers wiring the workflow core to the ports.

mod handle_turn;
mod start_session;

pub use handle_turn::{HandleTurnCommand, HandleTurnError, HandleTurnHandler, HandleTurnResult};
pub use start_session::{
    StartSessionCommand, StartSessionError, StartSessionHandler, StartSessionResult,
};
