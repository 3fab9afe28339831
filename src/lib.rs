//! Mockup Sherpa - conversational workflow orchestrator for UI mockups.
//!
//! A user describes the page they want; each turn is classified, routed
//! through a table of phases to a pipeline of reasoning stages, and
//! answered with one rendered message. Stages are LLM calls whose replies
//! are pulled into structured records by a tolerant extractor.
//!
//! The crate follows a hexagonal layout: `domain` holds the workflow rules,
//! `ports` the service contracts, `adapters` their implementations, and
//! `application` the orchestration that ties them together.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
