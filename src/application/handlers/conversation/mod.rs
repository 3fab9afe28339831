//! Conversation command and query handlers.
//!
//! Running turns, resetting sessions and reporting session status.

mod handle_turn;
mod reset_session;
mod session_status;

pub use handle_turn::{
    ConversationOrchestrator, StageOutcome, TurnDiagnostics, TurnError, TurnFailure, TurnRequest,
    TurnResponse, APOLOGY, MAX_UTTERANCE_LENGTH,
};
pub use reset_session::{
    ResetSessionCommand, ResetSessionError, ResetSessionHandler, ResetSessionResult, RESET_MESSAGE,
};
pub use session_status::{SessionStatus, SessionStatusError, SessionStatusHandler, SessionStatusQuery};
