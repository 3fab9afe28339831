//! Fixed instruction templates, one per stage.
//!
//! The system prompt tells the model what to return; the user message
//! carries the serialized [`StageInput`] and, for the recommendation stage,
//! the catalog templates it may choose from.

use crate::domain::workflow::{StageInput, StageKind};
use crate::ports::TemplateSummary;

const COMMON_RULES: &str = "\
Respond with a single JSON object and nothing else. \
If the request is too ambiguous to answer, respond with \
{\"ambiguous\": true, \"reason\": \"<what is unclear>\", \"options\": [\"<choice>\", ...]} instead.";

/// System prompt for `stage`.
pub fn system_prompt(stage: StageKind) -> String {
    let task = match stage {
        StageKind::Classify => {
            "You classify what a user wants in a UI mockup conversation. \
             Return {\"intent\": \"<label>\", \"page_type\": \"<category or null>\"}. \
             Labels: create_mockup, request_recommendations, question_answer, select_template, \
             clarification, modification, confirmation, edit_request, report, not_understood, general. \
             page_type is the kind of page mentioned, such as login, signup, dashboard, landing or profile."
        }
        StageKind::Requirements => {
            "You are a UI/UX requirements analyst. Extract requirements for the mockup from the \
             conversation. Return {\"page_type\": string, \"target_audience\": string, \
             \"style_preferences\": [string], \"key_features\": [string], \"color_scheme\": string, \
             \"layout_preferences\": [string], \"constraints\": [string], \"open_questions\": [string]}. \
             Omit anything the user has not indicated."
        }
        StageKind::Recommend => {
            "You recommend UI templates. Rank the catalog templates against the requirements and \
             return {\"candidates\": [{\"name\": string, \"description\": string, \"category\": string, \
             \"score\": number between 0 and 1, \"reasoning\": string}]}. Only recommend templates \
             from the catalog when one is provided. Order best match first."
        }
        StageKind::Questions => {
            "You help a user choose between recommended templates. Ask up to three short questions \
             that would separate the candidates. Return {\"questions\": [{\"question\": string, \
             \"options\": [string], \"focus_area\": string}]}."
        }
        StageKind::Select => {
            "You work out which recommended template the user picked. Return {\"selected\": <name or \
             1-based number from the recommendation list>}."
        }
        StageKind::Edit => {
            "You plan modifications to the selected UI template. Return {\"changes\": [{\"element\": \
             string, \"property\": string, \"value\": string, \"description\": string}], \
             \"summary\": string}."
        }
        StageKind::Report => {
            "You write the final summary of a mockup: the chosen template, the requirements it meets \
             and the modifications made. Return {\"summary\": string, \"sections\": [{\"title\": \
             string, \"body\": string}]}."
        }
        StageKind::Format => {
            "You are a friendly assistant guiding a user through creating a UI mockup. Reply to the \
             user's message in a sentence or two. Return {\"message\": string}."
        }
    };

    format!("{}\n\n{}", task, COMMON_RULES)
}

/// User message for one stage call.
pub fn user_prompt(input: &StageInput, catalog: &[TemplateSummary]) -> String {
    let payload = serde_json::to_string_pretty(input).unwrap_or_else(|_| input.utterance.clone());

    let mut prompt = format!("USER MESSAGE:\n{}\n\nSTAGE INPUT:\n{}", input.utterance, payload);

    if !catalog.is_empty() {
        prompt.push_str("\n\nCATALOG TEMPLATES:\n");
        for template in catalog {
            prompt.push_str(&format!("- {} [{}]", template.name, template.category));
            if let Some(description) = &template.description {
                prompt.push_str(&format!(": {}", description));
            }
            if !template.tags.is_empty() {
                prompt.push_str(&format!(" (tags: {})", template.tags.join(", ")));
            }
            prompt.push('\n');
        }
    }

    if let Some(request) = &input.answering {
        prompt.push_str(&format!(
            "\n\nThe user is answering this earlier question: {}",
            request.reason
        ));
    }

    prompt
}
