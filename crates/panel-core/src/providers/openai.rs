//! OpenAI backend policy

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::resolver::ProviderEndpoint;
use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::{BackendId, ModelDescriptor, ProviderInfo, RuntimeConfig, RuntimeState};

use super::catalog::{str_field, CatalogFormat, ModelCatalog};
use super::defaults::{backend_defaults, budget_or_default, model_or_default};
use super::error::ProviderResult;
use super::traits::ProviderPolicy;

const COMPONENT: &str = "OpenAiPolicy";

/// Catalog rules for `GET /models`
pub struct OpenAiCatalog;

impl OpenAiCatalog {
    fn family_of(id: &str) -> &'static str {
        if id.contains("gpt-4") {
            "GPT-4"
        } else if id.contains("gpt-3.5") {
            "GPT-3.5"
        } else {
            "Other GPT"
        }
    }

    fn family_rank(family: &str) -> u8 {
        match family {
            "GPT-4" => 0,
            "GPT-3.5" => 1,
            _ => 2,
        }
    }
}

impl CatalogFormat for OpenAiCatalog {
    fn backend(&self) -> BackendId {
        BackendId::OpenAi
    }

    fn normalize(&self, record: &Value) -> Option<ModelDescriptor> {
        let id = str_field(record, "id")?;
        let lower = id.to_lowercase();
        if !lower.contains("gpt") {
            return None;
        }
        Some(
            ModelDescriptor::new(id, id.replace("gpt-", "GPT-"), Self::family_of(&lower))
                .with_details(record.clone()),
        )
    }

    fn fallback(&self) -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("gpt-4o", "GPT-4o", "GPT-4"),
            ModelDescriptor::new("gpt-4-turbo", "GPT-4 Turbo", "GPT-4"),
            ModelDescriptor::new("gpt-4", "GPT-4", "GPT-4"),
            ModelDescriptor::new("gpt-3.5-turbo", "GPT-3.5 Turbo", "GPT-3.5"),
        ]
    }

    /// Newest family first, then by name
    fn sort(&self, models: &mut [ModelDescriptor]) {
        models.sort_by(|a, b| {
            (Self::family_rank(&a.family), &a.name).cmp(&(Self::family_rank(&b.family), &b.name))
        });
    }
}

/// Policy for the hosted OpenAI API
pub struct OpenAiPolicy {
    catalog: ModelCatalog<OpenAiCatalog>,
    logger: Arc<dyn Logger>,
}

impl OpenAiPolicy {
    /// Create the policy
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalog: ModelCatalog::new(OpenAiCatalog, client, endpoint, Arc::clone(&logger)),
            logger,
        }
    }
}

#[async_trait]
impl ProviderPolicy for OpenAiPolicy {
    fn backend(&self) -> BackendId {
        BackendId::OpenAi
    }

    fn info(&self) -> ProviderInfo {
        let defaults = backend_defaults(BackendId::OpenAi);
        ProviderInfo {
            id: BackendId::OpenAi,
            display_name: BackendId::OpenAi.display_name().to_string(),
            default_api_base: defaults.api_base.to_string(),
            requires_api_key: defaults.requires_api_key,
            default_model: defaults.model.to_string(),
        }
    }

    async fn list_models(&self) -> Vec<ModelDescriptor> {
        self.catalog.list_models().await
    }

    async fn get_model_details(&self, model_id: &str) -> ProviderResult<Value> {
        self.catalog.details(model_id).await
    }

    fn clear_model_cache(&self) {
        self.catalog.clear();
    }

    fn configure(&self, runtime: &SharedRuntime, config: &RuntimeConfig) -> Arc<RuntimeSnapshot> {
        let defaults = backend_defaults(BackendId::OpenAi);
        let logger = self.logger.as_ref();

        // Only a non-default base is handed to the engine
        let api_base = config
            .api_base
            .as_deref()
            .map(|b| b.trim_end_matches('/'))
            .filter(|b| !b.is_empty() && *b != defaults.api_base)
            .map(str::to_string);

        let state = RuntimeState {
            offline: false,
            model: model_or_default(config.model.as_deref(), defaults.model, COMPONENT, logger),
            api_key: config
                .api_key
                .clone()
                .or_else(|| self.catalog.endpoint().api_key.clone()),
            api_base,
            context_window: budget_or_default(
                config.context_window,
                defaults.context_window,
                "context_window",
                COMPONENT,
                logger,
            ),
            max_tokens: budget_or_default(
                config.max_tokens,
                defaults.max_tokens,
                "max_tokens",
                COMPONENT,
                logger,
            ),
            auto_run: true,
            verbose: config.verbose.unwrap_or(defaults.verbose),
        };

        self.logger.info(&format!("[{}] Configured model {}", COMPONENT, state.model));
        runtime.publish(BackendId::OpenAi, state)
    }
}
