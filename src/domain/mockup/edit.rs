use serde::{Deserialize, Serialize};

/// One change the edit stage wants applied to the selected template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditChange {
    /// Element being changed, e.g. "submit button".
    pub element: String,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EditChange {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            property: None,
            value: None,
            description: None,
        }
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self.value = Some(value.into());
        self
    }

    /// Renders the change as a short sentence for user messages.
    pub fn describe(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        match (&self.property, &self.value) {
            (Some(property), Some(value)) => {
                format!("{}: set {} to {}", self.element, property, value)
            }
            (Some(property), None) => format!("{}: adjust {}", self.element, property),
            _ => format!("{}: updated", self.element),
        }
    }
}

/// A batch of changes produced by a single edit request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditPlan {
    pub changes: Vec<EditChange>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_prefers_explicit_description() {
        let mut change = EditChange::new("header").set("color", "navy");
        change.description = Some("Darken the header".to_string());
        assert_eq!(change.describe(), "Darken the header");
    }

    #[test]
    fn describe_falls_back_to_property_and_value() {
        let change = EditChange::new("submit button").set("size", "large");
        assert_eq!(change.describe(), "submit button: set size to large");
    }

    #[test]
    fn describe_handles_bare_element() {
        assert_eq!(EditChange::new("footer").describe(), "footer: updated");
    }
}
