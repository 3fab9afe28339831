//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod conversation;

pub use conversation::{
    ConversationOrchestrator, ResetSessionCommand, ResetSessionError, ResetSessionHandler,
    ResetSessionResult, SessionStatus, SessionStatusError, SessionStatusHandler,
    SessionStatusQuery, StageOutcome, TurnDiagnostics, TurnError, TurnFailure, TurnRequest,
    TurnResponse,
};
