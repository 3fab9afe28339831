//! Deterministic intent guardrails.
//!
//! A versioned table of regex rules that can settle an intent before any
//! model call. Tables are YAML so they can change without touching the
//! model-based fallback.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::IntentLabel;
use crate::domain::session::Phase;

const DEFAULT_RULES_YAML: &str = include_str!("default_guardrails.yaml");

static DEFAULT_RULES: Lazy<GuardrailSet> = Lazy::new(|| {
    GuardrailSet::from_yaml(DEFAULT_RULES_YAML).expect("built-in guardrail rules are valid")
});

/// Errors raised while loading a guardrail table.
#[derive(Debug, Error)]
pub enum GuardrailError {
    #[error("failed to read guardrail file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid guardrail YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("rule '{rule}' has invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule}' names unknown phase '{phase}'")]
    UnknownPhase { rule: String, phase: String },

    #[error("rule '{0}' has no patterns")]
    EmptyRule(String),
}

/// One rule as written in the YAML table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailRule {
    pub name: String,
    pub label: IntentLabel,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Phases the rule applies in. Empty means every phase.
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub requires_selected_artifact: bool,
}

/// The YAML document shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailTable {
    pub version: String,
    pub rules: Vec<GuardrailRule>,
}

/// A rule that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailMatch {
    pub rule: String,
    pub label: IntentLabel,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    label: IntentLabel,
    patterns: Vec<Regex>,
    excludes: Vec<Regex>,
    phases: Vec<Phase>,
    requires_selected_artifact: bool,
}

impl CompiledRule {
    fn applies(&self, utterance: &str, phase: Phase, has_selected_artifact: bool) -> bool {
        if self.requires_selected_artifact && !has_selected_artifact {
            return false;
        }
        if !self.phases.is_empty() && !self.phases.contains(&phase) {
            return false;
        }
        if self.excludes.iter().any(|re| re.is_match(utterance)) {
            return false;
        }
        self.patterns.iter().any(|re| re.is_match(utterance))
    }
}

/// A compiled, versioned guardrail table.
#[derive(Debug, Clone)]
pub struct GuardrailSet {
    version: String,
    rules: Vec<CompiledRule>,
}

impl GuardrailSet {
    /// The rules shipped with the crate.
    pub fn builtin() -> Self {
        DEFAULT_RULES.clone()
    }

    /// A table with no rules; every utterance falls through to the model.
    pub fn empty() -> Self {
        Self {
            version: "empty".to_string(),
            rules: Vec::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, GuardrailError> {
        let table: GuardrailTable = serde_yaml::from_str(yaml)?;
        Self::compile(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GuardrailError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn compile(table: GuardrailTable) -> Result<Self, GuardrailError> {
        let rules = table
            .rules
            .into_iter()
            .map(compile_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: table.version,
            rules,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first rule matching the utterance in this context.
    pub fn evaluate(
        &self,
        utterance: &str,
        phase: Phase,
        has_selected_artifact: bool,
    ) -> Option<GuardrailMatch> {
        self.rules
            .iter()
            .find(|rule| rule.applies(utterance, phase, has_selected_artifact))
            .map(|rule| GuardrailMatch {
                rule: rule.name.clone(),
                label: rule.label,
            })
    }
}

fn compile_rule(rule: GuardrailRule) -> Result<CompiledRule, GuardrailError> {
    if rule.patterns.is_empty() {
        return Err(GuardrailError::EmptyRule(rule.name));
    }
    let patterns = compile_patterns(&rule.name, &rule.patterns)?;
    let excludes = compile_patterns(&rule.name, &rule.excludes)?;
    let phases = rule
        .phases
        .iter()
        .map(|name| {
            Phase::parse(name).ok_or_else(|| GuardrailError::UnknownPhase {
                rule: rule.name.clone(),
                phase: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledRule {
        name: rule.name,
        label: rule.label,
        patterns,
        excludes,
        phases,
        requires_selected_artifact: rule.requires_selected_artifact,
    })
}

fn compile_patterns(rule: &str, patterns: &[String]) -> Result<Vec<Regex>, GuardrailError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| GuardrailError::InvalidPattern {
                    rule: rule.to_string(),
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}
