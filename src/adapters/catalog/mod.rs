//! Template Catalog Adapters
//!
//! - **InMemoryTemplateCatalog** - Templates loaded once, optionally from YAML

mod in_memory_template_catalog;

pub use in_memory_template_catalog::InMemoryTemplateCatalog;
