//! Required-field checks that turn an extracted record into a typed
//! [`StagePayload`].
//!
//! Models are inconsistent about field names and types, so each stage
//! accepts a few aliases and coerces scalars where the intent is obvious.
//! Anything that still lacks a required field is a [`ShapeError`].

use serde_json::Value;
use thiserror::Error;

use super::{Ambiguity, IntentPayload, StageInput, StageKind, StagePayload};
use crate::domain::extraction::Record;
use crate::domain::mockup::{
    Candidate, ClarifyingQuestion, EditChange, EditPlan, Report, ReportSection, Requirements,
    SelectedArtifact,
};

/// Maximum length kept for any single string field.
pub const MAX_FIELD_LENGTH: usize = 10_000;

const DEFAULT_AMBIGUITY_REASON: &str = "I need a bit more detail before I can continue.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("selection '{0}' does not match any recommended template")]
    UnknownSelection(String),
}

/// Validates `record` against the shape `stage` must produce.
pub fn normalize_stage_output(
    stage: StageKind,
    record: &Record,
    input: &StageInput,
) -> Result<StagePayload, ShapeError> {
    if let Some(ambiguity) = ambiguity(record) {
        return Ok(StagePayload::Ambiguous(ambiguity));
    }

    match stage {
        StageKind::Classify => {
            let label = string_field(record, &["intent", "label"]).ok_or(ShapeError::MissingField("intent"))?;
            Ok(StagePayload::Intent(IntentPayload {
                label,
                page_type: string_field(record, &["page_type", "detected_page_type"]),
            }))
        }
        StageKind::Requirements => Ok(StagePayload::Requirements(requirements(record))),
        StageKind::Recommend => {
            let items = array_field(record, "candidates", &["candidates", "recommendations", "templates"])?;
            let mut candidates: Vec<Candidate> = items.iter().filter_map(candidate).collect();
            candidates.sort_by(|a, b| {
                let a = a.score.unwrap_or(0.0);
                let b = b.score.unwrap_or(0.0);
                b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
            });
            Ok(StagePayload::Recommendations(candidates))
        }
        StageKind::Questions => {
            let items = array_field(record, "questions", &["questions"])?;
            Ok(StagePayload::Questions(items.iter().filter_map(question).collect()))
        }
        StageKind::Select => selection(record, input).map(StagePayload::Selection),
        StageKind::Edit => {
            let items = array_field(record, "changes", &["changes", "modifications"])?;
            Ok(StagePayload::Edit(EditPlan {
                changes: items.iter().filter_map(edit_change).collect(),
                summary: string_field(record, &["summary"]),
            }))
        }
        StageKind::Report => {
            let summary = string_field(record, &["summary"]).ok_or(ShapeError::MissingField("summary"))?;
            let sections = record
                .get("sections")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(report_section).collect())
                .unwrap_or_default();
            Ok(StagePayload::Report(Report { summary, sections }))
        }
        StageKind::Format => string_field(record, &["message", "response", "text"])
            .map(StagePayload::Text)
            .ok_or(ShapeError::MissingField("message")),
    }
}

fn ambiguity(record: &Record) -> Option<Ambiguity> {
    let flagged = ["ambiguous", "clarification_needed"]
        .iter()
        .any(|key| record.get(*key).and_then(Value::as_bool).unwrap_or(false));
    if !flagged {
        return None;
    }
    Some(Ambiguity {
        reason: string_field(record, &["reason", "clarification_question", "question"])
            .unwrap_or_else(|| DEFAULT_AMBIGUITY_REASON.to_string()),
        options: string_list(record, &["options", "clarification_options"]),
    })
}

fn requirements(record: &Record) -> Requirements {
    let source = record
        .get("requirements")
        .and_then(Value::as_object)
        .unwrap_or(record);
    Requirements {
        page_type: string_field(source, &["page_type", "type"]),
        target_audience: string_field(source, &["target_audience", "audience"]),
        style_preferences: string_list(source, &["style_preferences", "style"]),
        key_features: string_list(source, &["key_features", "features"]),
        color_scheme: string_field(source, &["color_scheme", "colors"])
            .or_else(|| joined(string_list(source, &["color_scheme", "colors"]))),
        layout_preferences: string_list(source, &["layout_preferences", "layout"]),
        constraints: string_list(source, &["constraints"]),
        open_questions: string_list(source, &["open_questions", "questions_for_clarification"]),
    }
}

fn candidate(value: &Value) -> Option<Candidate> {
    if let Some(name) = scalar_string(value) {
        return Some(Candidate::named(name));
    }
    let item = value.as_object()?;
    // Either flat, or `{ "template": { ... }, "score": .., "reasoning": .. }`.
    let template = item.get("template").and_then(Value::as_object).unwrap_or(item);
    let name = string_field(template, &["name", "title"])?;
    Some(Candidate {
        name,
        description: string_field(template, &["description"]),
        category: string_field(template, &["category", "page_type"]),
        score: item
            .get("score")
            .or_else(|| item.get("match_score"))
            .and_then(Value::as_f64),
        reasoning: string_field(item, &["reasoning", "reason"]),
    })
}

fn question(value: &Value) -> Option<ClarifyingQuestion> {
    if let Some(text) = scalar_string(value) {
        return Some(ClarifyingQuestion::new(text));
    }
    let item = value.as_object()?;
    let text = string_field(item, &["question", "text"])?;
    Some(ClarifyingQuestion {
        question: text,
        options: string_list(item, &["options"]),
        focus_area: string_field(item, &["focus_area", "focus"]),
    })
}

fn selection(record: &Record, input: &StageInput) -> Result<SelectedArtifact, ShapeError> {
    let raw = record
        .get("selected")
        .or_else(|| record.get("template"))
        .ok_or(ShapeError::MissingField("selected"))?;
    let candidates = &input.projection.recommendations;

    if let Some(index) = raw.as_u64() {
        return usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| candidates.get(i))
            .map(Candidate::to_selected)
            .ok_or_else(|| ShapeError::UnknownSelection(index.to_string()));
    }

    let name = match raw {
        Value::String(s) => clean(s),
        Value::Object(obj) => string_field(obj, &["name", "title"]),
        _ => None,
    }
    .ok_or(ShapeError::WrongType {
        field: "selected",
        expected: "a template name or 1-based index",
    })?;

    if candidates.is_empty() {
        return Ok(SelectedArtifact::named(name));
    }
    let wanted = name.to_lowercase();
    candidates
        .iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .or_else(|| {
            candidates.iter().find(|c| {
                let have = c.name.to_lowercase();
                have.contains(&wanted) || wanted.contains(&have)
            })
        })
        .map(Candidate::to_selected)
        .ok_or(ShapeError::UnknownSelection(name))
}

fn edit_change(value: &Value) -> Option<EditChange> {
    if let Some(text) = scalar_string(value) {
        let mut change = EditChange::new("template");
        change.description = Some(text);
        return Some(change);
    }
    let item = value.as_object()?;
    let element = string_field(item, &["element", "target", "component"])
        .unwrap_or_else(|| "template".to_string());
    Some(EditChange {
        element,
        property: string_field(item, &["property", "attribute"]),
        value: string_field(item, &["value", "new_value"]),
        description: string_field(item, &["description", "change"]),
    })
}

fn report_section(value: &Value) -> Option<ReportSection> {
    let item = value.as_object()?;
    Some(ReportSection {
        title: string_field(item, &["title", "heading"])?,
        body: string_field(item, &["body", "content"]).unwrap_or_default(),
    })
}

fn array_field<'a>(
    record: &'a Record,
    name: &'static str,
    keys: &[&str],
) -> Result<&'a Vec<Value>, ShapeError> {
    let value = keys
        .iter()
        .find_map(|key| record.get(*key))
        .ok_or(ShapeError::MissingField(name))?;
    value.as_array().ok_or(ShapeError::WrongType {
        field: name,
        expected: "an array",
    })
}

/// First non-empty string (or number) among `keys`.
fn string_field(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(scalar_string)
}

/// Strings from an array field, or a single string as a one-element list.
fn string_list(record: &Record, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match record.get(*key) {
            Some(Value::Array(items)) => return items.iter().filter_map(scalar_string).collect(),
            Some(value) => {
                if let Some(single) = scalar_string(value) {
                    return vec![single];
                }
            }
            None => {}
        }
    }
    Vec::new()
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clean(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() <= MAX_FIELD_LENGTH {
        return Some(trimmed.to_string());
    }
    let mut end = MAX_FIELD_LENGTH;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    Some(format!("{}...[truncated]", &trimmed[..end]))
}

fn joined(items: Vec<String>) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}
