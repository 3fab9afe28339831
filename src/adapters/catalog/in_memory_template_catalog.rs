//! In-Memory Template Catalog Adapter
//!
//! Serves template lookups from a list loaded at startup, usually from a
//! YAML file:
//!
//! ```yaml
//! templates:
//!   - name: Clean Login
//!     category: login
//!     description: Centered card with email and password fields
//!     tags: [minimal, light]
//! ```
//!
//! Category and tag matching ignore ASCII case.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::ports::{CatalogError, TemplateCatalog, TemplateSummary};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    templates: Vec<TemplateSummary>,
}

/// Read-only template catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateCatalog {
    templates: Arc<Vec<TemplateSummary>>,
}

impl InMemoryTemplateCatalog {
    pub fn new(templates: Vec<TemplateSummary>) -> Self {
        Self {
            templates: Arc::new(templates),
        }
    }

    /// An empty catalog. Every lookup returns no templates.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::InvalidData(e.to_string()))?;

        if let Some(bad) = file
            .templates
            .iter()
            .find(|t| t.name.trim().is_empty() || t.category.trim().is_empty())
        {
            return Err(CatalogError::InvalidData(format!(
                "template entries need a name and a category (got name {:?})",
                bad.name
            )));
        }

        Ok(Self::new(file.templates))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CatalogError::Unavailable(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for template in self.templates.iter() {
            if !seen.iter().any(|c| c.eq_ignore_ascii_case(&template.category)) {
                seen.push(template.category.clone());
            }
        }
        seen
    }
}

#[async_trait]
impl TemplateCatalog for InMemoryTemplateCatalog {
    async fn by_category(&self, category: &str) -> Result<Vec<TemplateSummary>, CatalogError> {
        let category = category.trim();
        Ok(self
            .templates
            .iter()
            .filter(|t| t.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect())
    }

    async fn by_tag(&self, tag: &str) -> Result<Vec<TemplateSummary>, CatalogError> {
        let tag = tag.trim();
        Ok(self
            .templates
            .iter()
            .filter(|t| t.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag)))
            .cloned()
            .collect())
    }
}
