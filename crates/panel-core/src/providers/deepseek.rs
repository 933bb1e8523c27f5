//! DeepSeek backend policy

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::resolver::ProviderEndpoint;
use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::{BackendId, ModelDescriptor, ProviderInfo, RuntimeConfig, RuntimeState};

use super::catalog::{str_field, title_case, CatalogFormat, ModelCatalog};
use super::defaults::{
    backend_defaults, budget_or_default, model_or_default, DEEPSEEK_CODER_BUDGET,
};
use super::error::ProviderResult;
use super::traits::ProviderPolicy;

const COMPONENT: &str = "DeepSeekPolicy";

fn is_coder(model: &str) -> bool {
    model.to_lowercase().contains("coder")
}

/// Catalog rules for `GET /models`
pub struct DeepSeekCatalog;

impl CatalogFormat for DeepSeekCatalog {
    fn backend(&self) -> BackendId {
        BackendId::DeepSeek
    }

    fn normalize(&self, record: &Value) -> Option<ModelDescriptor> {
        let id = str_field(record, "id")?;
        let family = if is_coder(id) { "Deepseek Coder" } else { "Deepseek Chat" };
        Some(
            ModelDescriptor::new(id, title_case(&id.replace("deepseek-", "Deepseek ")), family)
                .with_details(record.clone()),
        )
    }

    fn fallback(&self) -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("deepseek-chat", "Deepseek Chat", "Deepseek Chat"),
            ModelDescriptor::new("deepseek-coder", "Deepseek Coder", "Deepseek Coder"),
        ]
    }
}

/// Policy for the hosted DeepSeek API
pub struct DeepSeekPolicy {
    catalog: ModelCatalog<DeepSeekCatalog>,
    logger: Arc<dyn Logger>,
}

impl DeepSeekPolicy {
    /// Create the policy
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalog: ModelCatalog::new(DeepSeekCatalog, client, endpoint, Arc::clone(&logger)),
            logger,
        }
    }
}

#[async_trait]
impl ProviderPolicy for DeepSeekPolicy {
    fn backend(&self) -> BackendId {
        BackendId::DeepSeek
    }

    fn info(&self) -> ProviderInfo {
        let defaults = backend_defaults(BackendId::DeepSeek);
        ProviderInfo {
            id: BackendId::DeepSeek,
            display_name: BackendId::DeepSeek.display_name().to_string(),
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
        let defaults = backend_defaults(BackendId::DeepSeek);
        let logger = self.logger.as_ref();
        let endpoint = self.catalog.endpoint();

        let model = model_or_default(config.model.as_deref(), defaults.model, COMPONENT, logger);

        // Coder models get the larger budget
        let (context_window, max_tokens) = if is_coder(&model) {
            DEEPSEEK_CODER_BUDGET
        } else {
            (defaults.context_window, defaults.max_tokens)
        };

        let state = RuntimeState {
            offline: false,
            api_key: config.api_key.clone().or_else(|| endpoint.api_key.clone()),
            api_base: Some(
                config
                    .api_base
                    .clone()
                    .filter(|b| !b.trim().is_empty())
                    .unwrap_or_else(|| endpoint.api_base.clone()),
            ),
            context_window: budget_or_default(
                config.context_window,
                context_window,
                "context_window",
                COMPONENT,
                logger,
            ),
            max_tokens: budget_or_default(
                config.max_tokens,
                max_tokens,
                "max_tokens",
                COMPONENT,
                logger,
            ),
            auto_run: true,
            verbose: config.verbose.unwrap_or(defaults.verbose),
            model,
        };

        self.logger.info(&format!(
            "[{}] Configured model {} ({} ctx / {} max)",
            COMPONENT, state.model, state.context_window, state.max_tokens
        ));
        runtime.publish(BackendId::DeepSeek, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use crate::logging::NoOpLogger;
    use crate::providers::ProviderError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn policy(base: &str) -> DeepSeekPolicy {
        DeepSeekPolicy::new(
            reqwest::Client::new(),
            ProviderEndpoint {
                api_base: base.to_string(),
                api_key: Some("ds-key".to_string()),
            },
            NoOpLogger::shared(),
        )
    }

    #[test]
    fn test_coder_model_gets_larger_budget() {
        let runtime = SharedRuntime::new();
        let policy = policy("https://api.deepseek.com/v1");

        let coder = policy.configure(&runtime, &RuntimeConfig::new().with_model("deepseek-coder"));
        assert_eq!((coder.state.context_window, coder.state.max_tokens), (16000, 8000));

        let chat = policy.configure(&runtime, &RuntimeConfig::new().with_model("deepseek-chat"));
        assert_eq!((chat.state.context_window, chat.state.max_tokens), (8192, 4096));
    }

    #[test]
    fn test_explicit_budget_overrides_coder_default() {
        let runtime = SharedRuntime::new();
        let config = RuntimeConfig::new()
            .with_model("deepseek-coder")
            .with_context_window(32000);
        let snapshot = policy("https://api.deepseek.com/v1").configure(&runtime, &config);

        assert_eq!(snapshot.state.context_window, 32000);
        assert_eq!(snapshot.state.max_tokens, 8000);
    }

    #[test]
    fn test_configure_defaults() {
        let runtime = SharedRuntime::new();
        let snapshot = policy("https://api.deepseek.com/v1").configure(&runtime, &RuntimeConfig::new());

        assert_eq!(snapshot.backend, BackendId::DeepSeek);
        assert_eq!(snapshot.state.model, "deepseek-chat");
        assert_eq!(snapshot.state.api_key.as_deref(), Some("ds-key"));
        assert_eq!(snapshot.state.api_base.as_deref(), Some("https://api.deepseek.com/v1"));
        assert!(snapshot.state.auto_run);
    }

    #[tokio::test]
    async fn test_live_catalog_names_and_families() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer ds-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "deepseek-reasoner"}, {"id": "deepseek-coder-v2"}]
            })))
            .mount(&server)
            .await;

        let models = policy(&server.uri()).list_models().await;
        assert_eq!(models[0].id, "deepseek-reasoner");
        assert_eq!(models[0].name, "Deepseek Reasoner");
        assert_eq!(models[0].family, "Deepseek Chat");
        assert_eq!(models[1].name, "Deepseek Coder-V2");
        assert_eq!(models[1].family, "Deepseek Coder");
    }

    #[tokio::test]
    async fn test_server_error_returns_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let policy = policy(&server.uri());
        let ids: Vec<_> = policy.list_models().await.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["deepseek-chat", "deepseek-coder"]);

        let err = policy.get_model_details("deepseek-v9").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::ModelNotFound { backend: BackendId::DeepSeek, ref model } if model == "deepseek-v9"
        ));
        assert_eq!(PanelError::from(err).status_code(), 404);
    }
}
