//! ReasoningStageClient - runs one stage against the completion service.
//!
//! One call to [`StageInvoker::invoke`] is one completion request. The
//! reply goes through the shared [`StructuredOutputExtractor`] and the
//! stage's shape check. Nothing here retries and nothing here returns an
//! error: every failure is folded into the [`StageResult`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::prompts;
use crate::domain::extraction::StructuredOutputExtractor;
use crate::domain::workflow::{normalize_stage_output, StageInput, StageKind, StageResult};
use crate::ports::{
    AIProvider, CompletionRequest, InvocationContext, MessageRole, RequestMetadata,
    StageInvoker, TemplateCatalog, TemplateSummary,
};

/// Most catalog entries handed to the recommendation stage.
pub const MAX_CATALOG_ENTRIES: usize = 20;

/// Per-stage request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StageClientConfig {
    pub default_max_tokens: u32,
    pub max_tokens: HashMap<StageKind, u32>,
    pub temperature: Option<f32>,
}

impl Default for StageClientConfig {
    fn default() -> Self {
        let max_tokens = [
            (StageKind::Classify, 256),
            (StageKind::Select, 256),
            (StageKind::Format, 512),
            (StageKind::Questions, 1024),
            (StageKind::Recommend, 2048),
            (StageKind::Report, 2048),
        ]
        .into_iter()
        .collect();

        Self {
            default_max_tokens: 1024,
            max_tokens,
            temperature: Some(0.2),
        }
    }
}

impl StageClientConfig {
    pub fn max_tokens_for(&self, stage: StageKind) -> u32 {
        self.max_tokens
            .get(&stage)
            .copied()
            .unwrap_or(self.default_max_tokens)
    }
}

/// [`StageInvoker`] backed by an [`AIProvider`].
pub struct ReasoningStageClient {
    provider: Arc<dyn AIProvider>,
    catalog: Option<Arc<dyn TemplateCatalog>>,
    extractor: StructuredOutputExtractor,
    config: StageClientConfig,
}

impl ReasoningStageClient {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            catalog: None,
            extractor: StructuredOutputExtractor::new(),
            config: StageClientConfig::default(),
        }
    }

    /// Lets the recommendation stage ground itself in catalog templates.
    pub fn with_catalog(mut self, catalog: Arc<dyn TemplateCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_config(mut self, config: StageClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_extractor(mut self, extractor: StructuredOutputExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Catalog templates for the recommendation stage.
    ///
    /// Looks up the category first and falls back to style tags. Lookup
    /// failures only cost the stage its grounding, so they are logged and
    /// skipped.
    async fn catalog_entries(&self, input: &StageInput) -> Vec<TemplateSummary> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        if input.stage != StageKind::Recommend {
            return Vec::new();
        }

        let requirements = input.projection.requirements.as_ref();
        let category = requirements
            .and_then(|r| r.page_type.clone())
            .or_else(|| input.projection.category.clone());

        let mut entries = Vec::new();
        if let Some(category) = &category {
            match catalog.by_category(category).await {
                Ok(found) => entries = found,
                Err(e) => tracing::warn!(category = %category, error = %e, "Catalog lookup failed"),
            }
        }

        if entries.is_empty() {
            let tags = requirements
                .map(|r| r.style_preferences.as_slice())
                .unwrap_or_default();
            for tag in tags {
                match catalog.by_tag(tag).await {
                    Ok(found) => {
                        for template in found {
                            if !entries.iter().any(|e: &TemplateSummary| e.name == template.name) {
                                entries.push(template);
                            }
                        }
                    }
                    Err(e) => tracing::warn!(tag = %tag, error = %e, "Catalog lookup failed"),
                }
            }
        }

        entries.truncate(MAX_CATALOG_ENTRIES);
        entries
    }

    /// Extraction and shape check for one raw reply.
    fn interpret(&self, input: &StageInput, raw: String) -> StageResult {
        let stage = input.stage;

        let record = match self.extractor.extract(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(stage = %stage, error = %e, "No structured output in reply");
                return StageResult::invalid_output(stage, raw, e.to_string());
            }
        };

        match normalize_stage_output(stage, &record, input) {
            Ok(payload) => StageResult::succeeded(stage, payload, raw),
            Err(e) => {
                tracing::debug!(stage = %stage, error = %e, "Reply failed shape check");
                StageResult::invalid_output(stage, raw, e.to_string())
            }
        }
    }
}

#[async_trait]
impl StageInvoker for ReasoningStageClient {
    async fn invoke(&self, ctx: &InvocationContext, input: &StageInput) -> StageResult {
        let stage = input.stage;
        let catalog = self.catalog_entries(input).await;

        let mut request =
            CompletionRequest::new(RequestMetadata::new(ctx.session_id, ctx.turn_id, stage))
                .with_system_prompt(prompts::system_prompt(stage))
                .with_message(MessageRole::User, prompts::user_prompt(input, &catalog))
                .with_max_tokens(self.config.max_tokens_for(stage));
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        match self.provider.complete(request).await {
            Ok(response) => self.interpret(input, response.content),
            Err(e) => {
                tracing::warn!(
                    stage = %stage,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Completion service call failed"
                );
                StageResult::service_unavailable(stage, e.is_retryable(), e.to_string())
            }
        }
    }
}
