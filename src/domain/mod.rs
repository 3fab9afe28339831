//! Domain layer containing the mockup workflow's types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps)
//! - `mockup` - Artifacts produced by reasoning stages
//! - `session` - Session aggregate, phases and slots
//! - `extraction` - Recovery of structured records from model text
//! - `workflow` - Stages, pipelines, intents, phase table and synthesis

pub mod extraction;
pub mod foundation;
pub mod mockup;
pub mod session;
pub mod workflow;
