//! Structured output recovery.
//!
//! Reasoning stages answer in free text that usually, but not always,
//! contains one JSON object. [`StructuredOutputExtractor`] digs that object
//! out and never panics on whatever else the model wrote.

mod extractor;
mod normalize;

pub use extractor::{
    ExtractionError, Record, StructuredOutputExtractor, MAX_RESPONSE_LENGTH,
};
pub use normalize::normalize_record_text;
