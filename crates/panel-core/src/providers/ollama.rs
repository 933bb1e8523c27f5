//! Ollama (local runtime) backend policy

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::logging::Logger;
use crate::resolver::ProviderEndpoint;
use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::{BackendId, ModelDescriptor, ProviderInfo, RuntimeConfig, RuntimeState};

use super::catalog::{str_field, title_case, CatalogFormat, ModelCatalog};
use super::defaults::{backend_defaults, budget_or_default, model_or_default, OLLAMA_NAMESPACE};
use super::error::ProviderResult;
use super::traits::ProviderPolicy;

const COMPONENT: &str = "OllamaPolicy";

/// Substring to family, first match wins
const FAMILIES: &[(&str, &str)] = &[
    ("llama", "Llama"),
    ("mistral", "Mistral"),
    ("mixtral", "Mistral"),
    ("codellama", "Llama"),
    ("gemma", "Gemma"),
];

/// Catalog rules for `GET /api/tags`
pub struct OllamaCatalog;

impl CatalogFormat for OllamaCatalog {
    fn backend(&self) -> BackendId {
        BackendId::Ollama
    }

    fn path(&self) -> &'static str {
        "/api/tags"
    }

    fn list_key(&self) -> &'static str {
        "models"
    }

    fn authenticated(&self) -> bool {
        false
    }

    fn normalize(&self, record: &Value) -> Option<ModelDescriptor> {
        let id = str_field(record, "name")?;
        let lower = id.to_lowercase();
        let family = FAMILIES
            .iter()
            .find(|(needle, _)| lower.contains(*needle))
            .map_or("Other", |&(_, family)| family);
        Some(
            ModelDescriptor::new(id, title_case(&id.replace('-', " ")), family)
                .with_details(record.clone()),
        )
    }

    fn fallback(&self) -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("llama3", "Llama 3", "Llama"),
            ModelDescriptor::new("llama2", "Llama 2", "Llama"),
            ModelDescriptor::new("mistral", "Mistral", "Mistral"),
            ModelDescriptor::new("mixtral", "Mixtral", "Mistral"),
            ModelDescriptor::new("codellama", "Code Llama", "Llama"),
        ]
    }

    fn missing_details(&self, id: &str) -> Value {
        json!({ "name": id })
    }
}

/// Prefix `model` with the runtime namespace unless it already has it
pub fn namespaced_model(model: &str) -> String {
    if model.starts_with(OLLAMA_NAMESPACE) {
        model.to_string()
    } else {
        format!("{}{}", OLLAMA_NAMESPACE, model)
    }
}

/// Policy for a local Ollama runtime
pub struct OllamaPolicy {
    catalog: ModelCatalog<OllamaCatalog>,
    logger: Arc<dyn Logger>,
}

impl OllamaPolicy {
    /// Create the policy
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalog: ModelCatalog::new(OllamaCatalog, client, endpoint, Arc::clone(&logger)),
            logger,
        }
    }
}

#[async_trait]
impl ProviderPolicy for OllamaPolicy {
    fn backend(&self) -> BackendId {
        BackendId::Ollama
    }

    fn info(&self) -> ProviderInfo {
        let defaults = backend_defaults(BackendId::Ollama);
        ProviderInfo {
            id: BackendId::Ollama,
            display_name: BackendId::Ollama.display_name().to_string(),
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
        let defaults = backend_defaults(BackendId::Ollama);
        let logger = self.logger.as_ref();

        let model = model_or_default(config.model.as_deref(), defaults.model, COMPONENT, logger);
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| self.catalog.endpoint().api_base.clone());

        let state = RuntimeState {
            offline: true,
            model: namespaced_model(&model),
            api_key: None,
            api_base: Some(api_base),
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
        runtime.publish(BackendId::Ollama, state)
    }
}
