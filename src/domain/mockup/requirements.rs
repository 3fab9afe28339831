use serde::{Deserialize, Serialize};

/// Requirements gathered for a mockup.
///
/// Every field is optional: the requirements stage fills what it can infer
/// from the conversation and leaves the rest for clarifying questions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    /// Page category such as "login", "dashboard" or "landing".
    pub page_type: Option<String>,
    pub target_audience: Option<String>,
    pub style_preferences: Vec<String>,
    pub key_features: Vec<String>,
    pub color_scheme: Option<String>,
    pub layout_preferences: Vec<String>,
    pub constraints: Vec<String>,
    /// Points the stage could not settle and wants the user to answer.
    pub open_questions: Vec<String>,
}

impl Requirements {
    /// Returns true if nothing useful was gathered.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Short human-readable summary used in prompts and reports.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(page_type) = &self.page_type {
            parts.push(format!("page type: {}", page_type));
        }
        if let Some(audience) = &self.target_audience {
            parts.push(format!("audience: {}", audience));
        }
        if !self.style_preferences.is_empty() {
            parts.push(format!("style: {}", self.style_preferences.join(", ")));
        }
        if !self.key_features.is_empty() {
            parts.push(format!("features: {}", self.key_features.join(", ")));
        }
        if let Some(colors) = &self.color_scheme {
            parts.push(format!("colors: {}", colors));
        }
        parts.join("; ")
    }
}
