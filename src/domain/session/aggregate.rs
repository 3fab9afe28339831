//! Session aggregate entity.
//!
//! A session is one mockup conversation: its phase, its history and the
//! slots the workflow has filled so far.
//!
//! # Ownership
//!
//! Only the conversation orchestrator mutates sessions, and only through
//! [`Session::apply`]. Everything else reads.

use serde::{Deserialize, Serialize};

use super::{Phase, SlotDiff, Slots};
use crate::domain::foundation::{SessionId, Timestamp};

/// Who said a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
    /// Phase the session was in when this line was recorded.
    pub phase: Phase,
    pub at: Timestamp,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            phase,
            at: Timestamp::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            phase,
            at: Timestamp::now(),
        }
    }
}

/// Everything one turn changes about a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub user_text: String,
    pub assistant_text: String,
    pub next_phase: Phase,
    pub diff: SlotDiff,
}

/// Session aggregate.
///
/// # Invariants
///
/// - exactly one current phase
/// - history is append-only and ordered by time
/// - slots change only through a whole [`SlotDiff`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    #[serde(default)]
    phase: Phase,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    slots: Slots,
    #[serde(default)]
    turn_count: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Creates an empty session in the initial phase.
    pub fn new(id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            phase: Phase::Initial,
            history: Vec::new(),
            slots: Slots::default(),
            turn_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the phase. Intended for seeding sessions in tests and tools.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Replaces the slots. Intended for seeding sessions in tests and tools.
    pub fn with_slots(mut self, slots: Slots) -> Self {
        self.slots = slots;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The last `n` history entries, oldest first.
    pub fn recent_history(&self, n: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Applies the outcome of one turn.
    ///
    /// This cannot fail, so callers that need all-or-nothing semantics
    /// apply the change to a clone and persist the clone.
    pub fn apply(&mut self, change: SessionChange) {
        self.history
            .push(HistoryEntry::user(change.user_text, self.phase));
        self.history
            .push(HistoryEntry::assistant(change.assistant_text, change.next_phase));
        change.diff.apply_to(&mut self.slots);
        self.phase = change.next_phase;
        self.turn_count += 1;
        self.updated_at = Timestamp::now();
    }
}
