//! Music Heard Worldwide backend policy

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::resolver::ProviderEndpoint;
use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::{BackendId, ModelDescriptor, ProviderInfo, RuntimeConfig, RuntimeState};

use super::catalog::{str_field, title_case, CatalogFormat, ModelCatalog};
use super::defaults::{backend_defaults, budget_or_default, model_or_default};
use super::error::ProviderResult;
use super::traits::ProviderPolicy;

const COMPONENT: &str = "MhwPolicy";

/// Catalog rules for `GET /models`
///
/// Records may carry their own `name` and `family`.
pub struct MhwCatalog;

impl CatalogFormat for MhwCatalog {
    fn backend(&self) -> BackendId {
        BackendId::Mhw
    }

    fn normalize(&self, record: &Value) -> Option<ModelDescriptor> {
        let id = str_field(record, "id")?;
        let name = str_field(record, "name")
            .map(str::to_string)
            .unwrap_or_else(|| title_case(&id.replace('-', " ")));
        let family = str_field(record, "family").unwrap_or("MHW");
        Some(ModelDescriptor::new(id, name, family).with_details(record.clone()))
    }

    fn fallback(&self) -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("default", "MHW Default", "MHW"),
            ModelDescriptor::new("mhw-1", "MHW-1", "MHW"),
        ]
    }
}

/// Policy for the Music Heard Worldwide API
pub struct MhwPolicy {
    catalog: ModelCatalog<MhwCatalog>,
    logger: Arc<dyn Logger>,
}

impl MhwPolicy {
    /// Create the policy
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalog: ModelCatalog::new(MhwCatalog, client, endpoint, Arc::clone(&logger)),
            logger,
        }
    }
}

#[async_trait]
impl ProviderPolicy for MhwPolicy {
    fn backend(&self) -> BackendId {
        BackendId::Mhw
    }

    fn info(&self) -> ProviderInfo {
        let defaults = backend_defaults(BackendId::Mhw);
        ProviderInfo {
            id: BackendId::Mhw,
            display_name: BackendId::Mhw.display_name().to_string(),
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
        let defaults = backend_defaults(BackendId::Mhw);
        let logger = self.logger.as_ref();
        let endpoint = self.catalog.endpoint();

        let state = RuntimeState {
            offline: false,
            model: model_or_default(config.model.as_deref(), defaults.model, COMPONENT, logger),
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
        runtime.publish(BackendId::Mhw, state)
    }
}
