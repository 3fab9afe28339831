//! Session domain module.
//!
//! A session tracks one mockup conversation: the current [`Phase`], the
//! ordered history, and the named [`Slots`] filled in by reasoning stages.
//! Slots change only through a [`SlotDiff`] applied by the orchestrator.

mod aggregate;
mod clarification;
mod phase;
mod slots;

pub use aggregate::{HistoryEntry, Session, SessionChange, Speaker};
pub use clarification::ClarificationRequest;
pub use phase::Phase;
pub use slots::{SlotDiff, SlotUpdate, Slots};
