//! Template Catalog Port - Read-only template lookups.
//!
//! Only the recommendation stage consults the catalog, to ground its
//! instruction in templates that actually exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A catalog entry as exposed to stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TemplateSummary {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("invalid catalog data: {0}")]
    InvalidData(String),
}

/// Port for template lookups.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Templates in a category such as "login" or "dashboard".
    async fn by_category(&self, category: &str) -> Result<Vec<TemplateSummary>, CatalogError>;

    /// Templates carrying a tag such as "minimal" or "dark".
    async fn by_tag(&self, tag: &str) -> Result<Vec<TemplateSummary>, CatalogError>;
}
