//! Recovery of one JSON object from noisy model output.

use serde_json::Value;
use thiserror::Error;

use super::normalize_record_text;

/// Maximum accepted response length (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

/// A recovered structured record.
pub type Record = serde_json::Map<String, Value>;

/// Errors that can occur during extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no structured record found in response")]
    NotFound,

    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },
}

/// Which strategy produced the record. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    FencedBlock,
    BalancedScan,
    OuterSpan,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Self::FencedBlock => "fenced_block",
            Self::BalancedScan => "balanced_scan",
            Self::OuterSpan => "outer_span",
        }
    }
}

/// Extracts one JSON object from free text.
///
/// Strategies run in order and the first one that yields an object wins:
///
/// 1. the interior of a fenced code block
/// 2. the first balanced `{ ... }` span that parses
/// 3. everything between the first `{` and the last `}`
///
/// Each candidate span is normalized with [`normalize_record_text`] before
/// parsing. The extractor is pure and deterministic.
#[derive(Debug, Clone)]
pub struct StructuredOutputExtractor {
    max_length: usize,
}

impl Default for StructuredOutputExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredOutputExtractor {
    pub fn new() -> Self {
        Self {
            max_length: MAX_RESPONSE_LENGTH,
        }
    }

    /// Overrides the maximum accepted input length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Recovers the record embedded in `text`.
    pub fn extract(&self, text: &str) -> Result<Record, ExtractionError> {
        if text.len() > self.max_length {
            return Err(ExtractionError::TooLong {
                max: self.max_length,
                actual: text.len(),
            });
        }

        let found = self
            .from_fenced_blocks(text)
            .map(|r| (r, Method::FencedBlock))
            .or_else(|| self.from_balanced_scan(text).map(|r| (r, Method::BalancedScan)))
            .or_else(|| self.from_outer_span(text).map(|r| (r, Method::OuterSpan)));

        match found {
            Some((record, strategy)) => {
                tracing::debug!(strategy = strategy.as_str(), fields = record.len(), "extracted record");
                Ok(record)
            }
            None => {
                tracing::debug!(length = text.len(), "no record in response");
                Err(ExtractionError::NotFound)
            }
        }
    }

    fn from_fenced_blocks(&self, text: &str) -> Option<Record> {
        let mut rest = text;
        while let Some(open) = rest.find("```") {
            let after_fence = &rest[open + 3..];
            // Skip an optional language tag such as `json`.
            let body_start = match after_fence.find('\n') {
                Some(newline) if !after_fence[..newline].contains('{') => newline + 1,
                _ => 0,
            };
            let body = &after_fence[body_start..];
            let close = body.find("```")?;
            if let Some(record) = parse_record(&body[..close]) {
                return Some(record);
            }
            rest = &body[close + 3..];
        }
        None
    }

    /// Tries every opening brace in turn. Input is capped at `max_length`,
    /// which bounds the scan.
    fn from_balanced_scan(&self, text: &str) -> Option<Record> {
        let mut from = 0;
        while let Some(found) = text[from..].find('{') {
            let start = from + found;
            if let Some(end) = balanced_end(text, start) {
                if let Some(record) = parse_record(&text[start..end]) {
                    return Some(record);
                }
            }
            from = start + 1;
        }
        None
    }

    fn from_outer_span(&self, text: &str) -> Option<Record> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        parse_record(&text[start..=end])
    }
}

/// Returns the byte offset just past the brace that closes the one at
/// `start`, honouring string literals and escapes.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_record(candidate: &str) -> Option<Record> {
    let normalized = normalize_record_text(candidate.trim());
    match serde_json::from_str::<Value>(&normalized) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
