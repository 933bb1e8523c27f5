//! Backend id to policy resolution

use std::sync::Arc;

use crate::logging::Logger;
use crate::resolver::ConfigurationResolver;
use crate::types::{BackendId, ProviderInfo};

use super::deepseek::DeepSeekPolicy;
use super::error::ProviderResult;
use super::mhw::MhwPolicy;
use super::ollama::OllamaPolicy;
use super::openai::OpenAiPolicy;
use super::traits::ProviderPolicy;

/// Holds one long-lived policy per backend
///
/// Policies are built once so each keeps its catalog cache across calls.
pub struct ProviderRegistry {
    openai: Arc<dyn ProviderPolicy>,
    ollama: Arc<dyn ProviderPolicy>,
    deepseek: Arc<dyn ProviderPolicy>,
    mhw: Arc<dyn ProviderPolicy>,
}

impl ProviderRegistry {
    /// Build every policy against the endpoints the resolver reports
    pub fn new(
        resolver: &ConfigurationResolver,
        client: reqwest::Client,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            openai: Arc::new(OpenAiPolicy::new(
                client.clone(),
                resolver.endpoint(BackendId::OpenAi),
                Arc::clone(&logger),
            )),
            ollama: Arc::new(OllamaPolicy::new(
                client.clone(),
                resolver.endpoint(BackendId::Ollama),
                Arc::clone(&logger),
            )),
            deepseek: Arc::new(DeepSeekPolicy::new(
                client.clone(),
                resolver.endpoint(BackendId::DeepSeek),
                Arc::clone(&logger),
            )),
            mhw: Arc::new(MhwPolicy::new(
                client,
                resolver.endpoint(BackendId::Mhw),
                logger,
            )),
        }
    }

    /// The policy for a backend
    pub fn resolve(&self, backend: BackendId) -> Arc<dyn ProviderPolicy> {
        let policy = match backend {
            BackendId::OpenAi => &self.openai,
            BackendId::Ollama => &self.ollama,
            BackendId::DeepSeek => &self.deepseek,
            BackendId::Mhw => &self.mhw,
        };
        Arc::clone(policy)
    }

    /// The policy for a backend given by its wire id
    ///
    /// Fails with `UnknownProvider` for anything outside the known set.
    pub fn resolve_str(&self, id: &str) -> ProviderResult<Arc<dyn ProviderPolicy>> {
        let backend: BackendId = id.parse()?;
        Ok(self.resolve(backend))
    }

    /// Descriptions of every backend, in a fixed order
    pub fn providers(&self) -> Vec<ProviderInfo> {
        BackendId::ALL
            .into_iter()
            .map(|backend| self.resolve(backend).info())
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("backends", &BackendId::ALL)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::providers::ProviderError;
    use std::collections::HashMap;

    fn registry(env: HashMap<String, String>) -> ProviderRegistry {
        let resolver = ConfigurationResolver::new(Arc::new(env), NoOpLogger::shared());
        ProviderRegistry::new(&resolver, reqwest::Client::new(), NoOpLogger::shared())
    }

    #[test]
    fn test_resolve_returns_matching_policy() {
        let registry = registry(HashMap::new());
        for backend in BackendId::ALL {
            assert_eq!(registry.resolve(backend).backend(), backend);
        }
        assert!(Arc::ptr_eq(
            &registry.resolve(BackendId::Ollama),
            &registry.resolve(BackendId::Ollama)
        ));
    }

    #[test]
    fn test_resolve_str_is_case_insensitive_and_rejects_unknown() {
        let registry = registry(HashMap::new());
        assert_eq!(registry.resolve_str("DeepSeek").unwrap().backend(), BackendId::DeepSeek);

        let err = registry.resolve_str("anthropic").err().unwrap();
        assert!(matches!(err, ProviderError::UnknownProvider(ref id) if id == "anthropic"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_providers_listing() {
        let registry = registry(HashMap::new());
        let providers = registry.providers();
        let ids: Vec<_> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["openai", "ollama", "deepseek", "mhw"]);
        assert!(!providers[1].requires_api_key);
        assert_eq!(providers[2].default_model, "deepseek-chat");
    }
}
