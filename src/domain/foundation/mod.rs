//! Foundation module - Shared domain primitives.
//!
//! Identifiers and time values used across the mockup conversation domain.

mod ids;
mod timestamp;

pub use ids::{SessionId, TurnId};
pub use timestamp::Timestamp;
