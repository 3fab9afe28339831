//! Mockup artifacts produced by reasoning stages.
//!
//! These are the normalized shapes that stages hand to each other and that
//! end up in session slots: gathered requirements, ranked template
//! candidates, clarifying questions, the selected template, edit plans and
//! the final report.

mod edit;
mod questions;
mod report;
mod requirements;
mod template;

pub use edit::{EditChange, EditPlan};
pub use questions::ClarifyingQuestion;
pub use report::{Report, ReportSection};
pub use requirements::Requirements;
pub use template::{Candidate, SelectedArtifact};
