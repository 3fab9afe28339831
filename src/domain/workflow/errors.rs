use thiserror::Error;

use crate::domain::session::Phase;

/// Internal workflow bugs. These abort the turn without touching the
/// session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("phase invariant violated: {from} cannot move to undeclared phase {to}")]
    PhaseInvariantViolation { from: Phase, to: Phase },

    #[error("phase table has no routes for phase {0}")]
    MissingPhase(Phase),
}
