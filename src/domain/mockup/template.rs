use serde::{Deserialize, Serialize};

/// A template proposed by the recommendation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Match score, either a fraction in `0.0..=1.0` or a percentage.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl Candidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            score: None,
            reasoning: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Match score as a whole percentage, clamped to 0..=100.
    pub fn match_percent(&self) -> Option<u8> {
        let score = self.score?;
        if !score.is_finite() {
            return None;
        }
        let percent = if score <= 1.0 { score * 100.0 } else { score };
        Some(percent.round().clamp(0.0, 100.0) as u8)
    }

    /// Turns this candidate into the session's selected artifact.
    pub fn to_selected(&self) -> SelectedArtifact {
        SelectedArtifact {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
        }
    }
}

/// The template the user settled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedArtifact {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl SelectedArtifact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_score_becomes_percent() {
        assert_eq!(Candidate::named("a").with_score(0.87).match_percent(), Some(87));
    }

    #[test]
    fn percentage_score_is_kept() {
        assert_eq!(Candidate::named("a").with_score(92.0).match_percent(), Some(92));
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        assert_eq!(Candidate::named("a").with_score(250.0).match_percent(), Some(100));
        assert_eq!(Candidate::named("a").with_score(-3.0).match_percent(), Some(0));
    }

    #[test]
    fn missing_or_nan_score_has_no_percent() {
        assert_eq!(Candidate::named("a").match_percent(), None);
        assert_eq!(Candidate::named("a").with_score(f64::NAN).match_percent(), None);
    }

    #[test]
    fn selection_keeps_name_and_category() {
        let selected = Candidate::named("Clean Login")
            .with_category("login")
            .with_score(0.9)
            .to_selected();
        assert_eq!(selected.name, "Clean Login");
        assert_eq!(selected.category.as_deref(), Some("login"));
    }
}
