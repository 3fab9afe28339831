//! Turns a pipeline result into the one message the user sees.

use serde::Serialize;
use std::fmt::Write;

use super::{Ambiguity, PipelineResult, StageKind, StagePayload, TerminalPayload};
use crate::domain::mockup::{Candidate, ClarifyingQuestion, EditPlan, Report, SelectedArtifact};
use crate::domain::session::{ClarificationRequest, Session};

/// At most this many candidates or questions are listed in one message.
pub const MAX_LISTED: usize = 3;

pub const GENERIC_FALLBACK: &str =
    "I've processed your request. Let me know how you'd like to proceed.";

/// The logical shape of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ClarifyingQuestions,
    SingleCandidate,
    CandidateList,
    NoCandidates,
    ClarificationNeeded,
    AskToRephrase,
    TemplateSelected,
    EditApplied,
    ReportReady,
    Text,
    Fallback,
}

/// A rendered reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub text: String,
    pub kind: MessageKind,
}

impl UserMessage {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Renders pipeline results. Stateless; the same input always yields the
/// same message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSynthesizer;

impl ResponseSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, result: &PipelineResult, session: &Session) -> UserMessage {
        if let Some(request) = &result.clarification {
            return clarification_needed(request);
        }

        match &result.terminal {
            Some(TerminalPayload::AskToClarify { stage }) => ask_to_rephrase(*stage),
            Some(TerminalPayload::Canned { text }) => UserMessage::new(MessageKind::Text, text.clone()),
            Some(TerminalPayload::Stage { payload }) => self.render_payload(payload, result, session),
            None => UserMessage::new(MessageKind::Fallback, GENERIC_FALLBACK),
        }
    }

    fn render_payload(&self, payload: &StagePayload, result: &PipelineResult, session: &Session) -> UserMessage {
        match payload {
            StagePayload::Questions(questions) => {
                let candidates = match result.payload_of(StageKind::Recommend) {
                    Some(StagePayload::Recommendations(list)) => list.as_slice(),
                    _ => session.slots().recommendations.as_slice(),
                };
                if questions.is_empty() {
                    return candidate_message(candidates);
                }
                clarifying_questions(candidates, questions)
            }
            StagePayload::Recommendations(candidates) => candidate_message(candidates),
            StagePayload::Selection(artifact) => template_selected(artifact),
            StagePayload::Edit(plan) => edit_applied(plan, session.slots().selected_artifact.as_ref()),
            StagePayload::Report(report) => report_ready(report),
            StagePayload::Text(text) => UserMessage::new(MessageKind::Text, text.clone()),
            StagePayload::Ambiguous(ambiguity) => ambiguous(ambiguity),
            StagePayload::Intent(_) | StagePayload::Requirements(_) => {
                UserMessage::new(MessageKind::Fallback, GENERIC_FALLBACK)
            }
        }
    }
}

fn candidate_message(candidates: &[Candidate]) -> UserMessage {
    match candidates {
        [] => UserMessage::new(
            MessageKind::NoCandidates,
            "I couldn't find a matching template yet. Tell me a bit more about the page \
             you have in mind, such as its purpose, audience or style.",
        ),
        [only] => single_candidate(only),
        many => {
            let mut text = candidate_list(many);
            text.push_str(
                "\nTo proceed, please choose a template by saying its name or number.",
            );
            UserMessage::new(MessageKind::CandidateList, text)
        }
    }
}

fn single_candidate(candidate: &Candidate) -> UserMessage {
    let mut text = format!(
        "I found a template that fits your needs: **{}**{}.",
        candidate.name,
        match_suffix(candidate)
    );
    if let Some(description) = &candidate.description {
        let _ = write!(text, " {}", description);
    }
    text.push_str(
        "\n\nI've selected it for you. You can ask me to adjust it, for example \
         \"make the header larger\", or say you're done to generate the report.",
    );
    UserMessage::new(MessageKind::SingleCandidate, text)
}

fn candidate_list(candidates: &[Candidate]) -> String {
    let mut text = format!(
        "I found {} great templates for you. Here are the top matches:\n\n",
        candidates.len()
    );
    for (i, candidate) in candidates.iter().take(MAX_LISTED).enumerate() {
        let _ = writeln!(text, "{}. **{}**{}", i + 1, candidate.name, match_suffix(candidate));
        if let Some(description) = &candidate.description {
            let _ = writeln!(text, "   {}", description);
        }
    }
    text
}

fn clarifying_questions(candidates: &[Candidate], questions: &[ClarifyingQuestion]) -> UserMessage {
    let mut text = if candidates.is_empty() {
        String::new()
    } else {
        candidate_list(candidates)
    };
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(
        "Please answer any of these questions to help me narrow down the best template for you:\n\n",
    );
    for (i, question) in questions.iter().take(MAX_LISTED).enumerate() {
        let _ = writeln!(text, "{}. {}", i + 1, question.question);
        if !question.options.is_empty() {
            let _ = writeln!(text, "   Options: {}", question.options.join(", "));
        }
    }
    if !candidates.is_empty() {
        text.push_str(
            "\nTo proceed, please choose a template by saying its name or number, \
             or answer the questions above.",
        );
    }
    UserMessage::new(MessageKind::ClarifyingQuestions, text)
}

fn clarification_needed(request: &ClarificationRequest) -> UserMessage {
    UserMessage::new(
        MessageKind::ClarificationNeeded,
        with_options(&request.reason, &request.options),
    )
}

fn ambiguous(ambiguity: &Ambiguity) -> UserMessage {
    UserMessage::new(
        MessageKind::ClarificationNeeded,
        with_options(&ambiguity.reason, &ambiguity.options),
    )
}

fn with_options(reason: &str, options: &[String]) -> String {
    let mut text = reason.to_string();
    if !options.is_empty() {
        text.push_str("\n\n");
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, option);
        }
        // Drop the trailing newline from the last option.
        text.truncate(text.trim_end().len());
    }
    text
}

fn ask_to_rephrase(stage: StageKind) -> UserMessage {
    UserMessage::new(
        MessageKind::AskToRephrase,
        format!(
            "I ran into a problem during {}. Could you rephrase your request or add a \
             little more detail about what you need?",
            stage.display_name()
        ),
    )
}

fn template_selected(artifact: &SelectedArtifact) -> UserMessage {
    UserMessage::new(
        MessageKind::TemplateSelected,
        format!(
            "Great choice! I've selected **{}**. You can ask me to change colors, sizes or \
             layout, or say you're done to generate the report.",
            artifact.name
        ),
    )
}

fn edit_applied(plan: &EditPlan, artifact: Option<&SelectedArtifact>) -> UserMessage {
    let target = artifact.map(|a| a.name.as_str()).unwrap_or("your template");
    let mut text = match &plan.summary {
        Some(summary) => format!("I've updated {}: {}", target, summary),
        None => format!("I've updated {}.", target),
    };
    if !plan.changes.is_empty() {
        text.push_str("\n\n");
        for change in &plan.changes {
            let _ = writeln!(text, "- {}", change.describe());
        }
        text.truncate(text.trim_end().len());
    }
    text.push_str("\n\nWhat else would you like to change?");
    UserMessage::new(MessageKind::EditApplied, text)
}

fn report_ready(report: &Report) -> UserMessage {
    let mut text = format!("Your mockup report is ready.\n\n{}", report.summary);
    for section in &report.sections {
        let _ = write!(text, "\n\n**{}**\n{}", section.title, section.body);
    }
    UserMessage::new(MessageKind::ReportReady, text)
}

fn match_suffix(candidate: &Candidate) -> String {
    candidate
        .match_percent()
        .map(|p| format!(" (Match: {}%)", p))
        .unwrap_or_default()
}
