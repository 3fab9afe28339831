//! Wires adapters into a [`ConversationOrchestrator`] from configuration.

use secrecy::ExposeSecret;
use std::sync::Arc;
use thiserror::Error;

use super::handlers::ConversationOrchestrator;
use super::intent_classifier::IntentClassifier;
use super::resilient_invoker::ResilientStageInvoker;
use super::stage_client::{ReasoningStageClient, StageClientConfig};
use crate::adapters::ai::{AnthropicConfig, AnthropicProvider, MockAIProvider};
use crate::adapters::catalog::InMemoryTemplateCatalog;
use crate::adapters::storage::{FileSessionStore, InMemorySessionStore, RedisSessionStore};
use crate::config::{AiConfig, AiProvider, AppConfig, StorageBackend, StorageConfig, ValidationError};
use crate::domain::workflow::{GuardrailError, GuardrailSet};
use crate::ports::{AIError, AIProvider, CatalogError, SessionStore, SessionStoreError, StageInvoker};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Failed to create AI provider: {0}")]
    Provider(#[from] AIError),

    #[error("Failed to load template catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to load guardrails: {0}")]
    Guardrails(#[from] GuardrailError),

    #[error("Failed to open session store: {0}")]
    Store(#[from] SessionStoreError),
}

/// Validates `config` and builds a ready orchestrator.
///
/// The redis backend connects here, so a bad URL fails at startup rather
/// than on the first turn.
pub async fn build_orchestrator(config: &AppConfig) -> Result<ConversationOrchestrator, BootstrapError> {
    config.validate()?;

    let provider = provider(&config.ai)?;
    let mut client = ReasoningStageClient::new(provider).with_config(stage_client_config(&config.ai));
    if let Some(path) = &config.catalog.path {
        let catalog = InMemoryTemplateCatalog::load(path)?;
        tracing::info!(path = %path.display(), templates = catalog.len(), "Loaded template catalog");
        client = client.with_catalog(Arc::new(catalog));
    }

    let invoker: Arc<dyn StageInvoker> = Arc::new(ResilientStageInvoker::new(
        Arc::new(client),
        config.pipeline.stage_timeout(),
        config.pipeline.retry_policy(),
    ));

    let guardrails = match &config.intent.guardrails_path {
        Some(path) => GuardrailSet::load(path)?,
        None => GuardrailSet::builtin(),
    };
    tracing::info!(version = guardrails.version(), rules = guardrails.len(), "Guardrails ready");
    let classifier = IntentClassifier::new(guardrails, invoker.clone())
        .with_model_fallback(config.intent.model_fallback);

    let store = session_store(&config.storage).await?;

    Ok(ConversationOrchestrator::new(invoker, store).with_classifier(classifier))
}

fn provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, BootstrapError> {
    match config.provider {
        AiProvider::Mock => {
            tracing::warn!("Using mock AI provider");
            Ok(Arc::new(MockAIProvider::new()))
        }
        AiProvider::Anthropic => {
            let key = config
                .anthropic_api_key
                .as_ref()
                .ok_or(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))?;
            let mut anthropic = AnthropicConfig::new(key.expose_secret().as_str())
                .with_model(config.model.as_str())
                .with_timeout(config.timeout());
            if let Some(url) = &config.base_url {
                anthropic = anthropic.with_base_url(url.as_str());
            }
            Ok(Arc::new(AnthropicProvider::new(anthropic)?))
        }
    }
}

fn stage_client_config(config: &AiConfig) -> StageClientConfig {
    let mut client = StageClientConfig {
        default_max_tokens: config.default_max_tokens,
        temperature: Some(config.temperature),
        ..StageClientConfig::default()
    };
    client
        .max_tokens
        .extend(config.stage_max_tokens.iter().map(|(stage, tokens)| (*stage, *tokens)));
    client
}

async fn session_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>, BootstrapError> {
    let store: Arc<dyn SessionStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemorySessionStore::new()),
        StorageBackend::File => {
            tracing::info!(path = %config.path.display(), "Using file session store");
            Arc::new(FileSessionStore::new(&config.path))
        }
        StorageBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or(ValidationError::MissingRequired("STORAGE__REDIS_URL"))?;
            let mut store = RedisSessionStore::connect(url)
                .await?
                .with_key_prefix(config.key_prefix.as_str());
            if let Some(ttl) = config.ttl() {
                store = store.with_ttl(ttl);
            }
            tracing::info!(prefix = %config.key_prefix, "Using redis session store");
            Arc::new(store)
        }
    };
    Ok(store)
}
