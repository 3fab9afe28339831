//! Stage Invoker Port - runs one reasoning stage.

use async_trait::async_trait;

use crate::domain::foundation::{SessionId, TurnId};
use crate::domain::workflow::{StageInput, StageResult};

/// Identifies the turn a stage call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationContext {
    pub session_id: SessionId,
    pub turn_id: TurnId,
}

impl InvocationContext {
    pub fn new(session_id: SessionId, turn_id: TurnId) -> Self {
        Self {
            session_id,
            turn_id,
        }
    }
}

/// Port for invoking a reasoning stage.
///
/// Implementations never fail: every problem is reported inside the
/// returned [`StageResult`].
#[async_trait]
pub trait StageInvoker: Send + Sync {
    async fn invoke(&self, ctx: &InvocationContext, input: &StageInput) -> StageResult;
}
