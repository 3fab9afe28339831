//! Conversation phases for the mockup workflow.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Where a mockup conversation currently stands.
///
/// Phases usually flow `Initial` → `RequirementsGathering` →
/// `Recommendation` → `Selection` → `Editing` → `ReportReady`, but the
/// phase table may skip ahead (a single recommended template goes straight
/// to `Selection`) or jump back (an edit request after the report returns
/// to `Editing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has been asked yet.
    Initial,
    /// Requirements are being collected from the user.
    RequirementsGathering,
    /// Candidate templates have been proposed.
    Recommendation,
    /// A template is selected and awaiting edits or a report.
    Selection,
    /// The selected template is being modified.
    Editing,
    /// A report has been generated.
    ReportReady,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Initial,
        Phase::RequirementsGathering,
        Phase::Recommendation,
        Phase::Selection,
        Phase::Editing,
        Phase::ReportReady,
    ];

    /// Stable snake_case name used for storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::RequirementsGathering => "requirements_gathering",
            Self::Recommendation => "recommendation",
            Self::Selection => "selection",
            Self::Editing => "editing",
            Self::ReportReady => "report_ready",
        }
    }

    /// Returns a label suitable for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initial => "Getting started",
            Self::RequirementsGathering => "Gathering requirements",
            Self::Recommendation => "Recommending templates",
            Self::Selection => "Template selected",
            Self::Editing => "Editing",
            Self::ReportReady => "Report ready",
        }
    }

    /// Parses a stored phase name.
    ///
    /// Accepts the legacy names older sessions were written with.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "initial" => Some(Self::Initial),
            "requirements_gathering" | "requirements" => Some(Self::RequirementsGathering),
            "recommendation" | "template_recommendation" => Some(Self::Recommendation),
            "selection" | "template_selection" => Some(Self::Selection),
            "editing" => Some(Self::Editing),
            "report_ready" | "report_generation" => Some(Self::ReportReady),
            _ => None,
        }
    }

    /// Parses a stored phase name, falling back to `Initial` for anything
    /// unrecognized.
    pub fn parse_or_initial(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Initial
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        let phase = Phase::parse(&name);
        if phase.is_none() {
            tracing::warn!(stored = %name, "unknown phase in stored session, resetting to initial");
        }
        Ok(phase.unwrap_or_default())
    }
}
