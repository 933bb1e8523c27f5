//! Backend switching with hosted-primary fallback

use std::sync::Arc;

use crate::logging::Logger;
use crate::resolver::ConfigurationResolver;
use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::BackendId;

use super::error::{ProviderError, ProviderResult};
use super::registry::ProviderRegistry;

/// Resolves configuration, picks the policy and publishes the runtime state
///
/// If the selected backend cannot be configured, the switch retries exactly
/// once with the hosted-primary backend before giving up.
pub struct BackendSwitch {
    resolver: ConfigurationResolver,
    registry: Arc<ProviderRegistry>,
    runtime: Arc<SharedRuntime>,
    logger: Arc<dyn Logger>,
}

impl BackendSwitch {
    pub fn new(
        resolver: ConfigurationResolver,
        registry: Arc<ProviderRegistry>,
        runtime: Arc<SharedRuntime>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            resolver,
            registry,
            runtime,
            logger,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn runtime(&self) -> &Arc<SharedRuntime> {
        &self.runtime
    }

    pub fn resolver(&self) -> &ConfigurationResolver {
        &self.resolver
    }

    /// Configure `backend` (or the environment's active backend) and an
    /// optional model
    pub fn configure(
        &self,
        backend: Option<BackendId>,
        model: Option<&str>,
    ) -> ProviderResult<Arc<RuntimeSnapshot>> {
        let selected = backend.unwrap_or_else(|| self.resolver.active_backend());

        match self.apply(selected, model) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if selected == BackendId::OpenAi => {
                self.logger.error(&format!(
                    "[BackendSwitch] Failed to configure {}: {}",
                    selected, e
                ));
                Err(e)
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "[BackendSwitch] Failed to configure {}: {}; falling back to {}",
                    selected,
                    e,
                    BackendId::OpenAi
                ));
                self.apply(BackendId::OpenAi, None).map_err(|fallback_err| {
                    self.logger.error(&format!(
                        "[BackendSwitch] Fallback to {} failed: {}",
                        BackendId::OpenAi,
                        fallback_err
                    ));
                    fallback_err
                })
            }
        }
    }

    /// Like [`configure`](Self::configure), with the backend given by its wire id
    ///
    /// An unknown id is rejected before any fallback is considered.
    pub fn configure_str(
        &self,
        backend: &str,
        model: Option<&str>,
    ) -> ProviderResult<Arc<RuntimeSnapshot>> {
        let backend: BackendId = backend.parse()?;
        self.configure(Some(backend), model)
    }

    fn apply(&self, backend: BackendId, model: Option<&str>) -> ProviderResult<Arc<RuntimeSnapshot>> {
        let (backend, config) = self
            .resolver
            .resolve_with(Some(backend), model)
            .map_err(ProviderError::from)?;
        let policy = self.registry.resolve(backend);
        Ok(policy.configure(&self.runtime, &config))
    }
}

impl std::fmt::Debug for BackendSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSwitch")
            .field("resolver", &self.resolver)
            .field("runtime", &self.runtime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use std::collections::HashMap;

    fn switch_with(pairs: &[(&str, &str)], logger: Arc<dyn Logger>) -> BackendSwitch {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resolver = ConfigurationResolver::new(Arc::new(env), Arc::clone(&logger));
        let registry = Arc::new(ProviderRegistry::new(
            &resolver,
            reqwest::Client::new(),
            Arc::clone(&logger),
        ));
        BackendSwitch::new(resolver, registry, Arc::new(SharedRuntime::new()), logger)
    }

    #[test]
    fn test_every_backend_matches_default_table() {
        let switch = switch_with(&[], NoOpLogger::shared());
        let expected = [
            (BackendId::OpenAi, "gpt-4o", 10000, 4096, false),
            (BackendId::Ollama, "ollama/llama3", 4000, 3000, true),
            (BackendId::DeepSeek, "deepseek-chat", 8192, 4096, false),
            (BackendId::Mhw, "default", 8192, 4096, false),
        ];

        for (backend, model, context_window, max_tokens, verbose) in expected {
            let snapshot = switch.configure(Some(backend), None).unwrap();
            assert_eq!(snapshot.backend, backend);
            assert_eq!(snapshot.state.model, model);
            assert_eq!(snapshot.state.context_window, context_window);
            assert_eq!(snapshot.state.max_tokens, max_tokens);
            assert_eq!(snapshot.state.verbose, verbose);
            assert!(snapshot.state.auto_run);
        }
        assert_eq!(switch.runtime().load().version, 4);
    }

    #[test]
    fn test_active_backend_comes_from_environment() {
        let switch = switch_with(
            &[("PROVIDER", "deepseek"), ("DEEPSEEK_MODEL", "deepseek-coder")],
            NoOpLogger::shared(),
        );
        let snapshot = switch.configure(None, None).unwrap();
        assert_eq!(snapshot.backend, BackendId::DeepSeek);
        assert_eq!(snapshot.state.context_window, 16000);
    }

    #[test]
    fn test_model_override_wins_over_environment() {
        let switch = switch_with(&[("OLLAMA_MODEL", "mistral")], NoOpLogger::shared());
        let snapshot = switch.configure(Some(BackendId::Ollama), Some("gemma")).unwrap();
        assert_eq!(snapshot.state.model, "ollama/gemma");
    }

    #[test]
    fn test_failed_backend_falls_back_to_primary() {
        let logger = Arc::new(MemoryLogger::new());
        let switch = switch_with(&[("MHW_MAX_TOKENS", "lots")], logger.clone());

        let snapshot = switch.configure(Some(BackendId::Mhw), None).unwrap();
        assert_eq!(snapshot.backend, BackendId::OpenAi);
        assert_eq!(snapshot.state.model, "gpt-4o");
        assert!(logger.contains(LogLevel::Warn, "falling back to openai"));
    }

    #[test]
    fn test_fallback_failure_propagates() {
        let switch = switch_with(
            &[("OLLAMA_CONTEXT_WINDOW", "0"), ("MAX_TOKENS", "-1")],
            NoOpLogger::shared(),
        );
        let err = switch.configure(Some(BackendId::Ollama), None).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
        assert_eq!(switch.runtime().load().version, 0);
    }

    #[test]
    fn test_primary_failure_does_not_retry() {
        let logger = Arc::new(MemoryLogger::new());
        let switch = switch_with(&[("OPENAI_CONTEXT_WINDOW", "x")], logger.clone());
        assert!(switch.configure(Some(BackendId::OpenAi), None).is_err());
        assert!(!logger.contains(LogLevel::Warn, "falling back"));
        assert_eq!(logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let switch = switch_with(&[], NoOpLogger::shared());
        let err = switch.configure_str("anthropic", None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(_)));
        assert_eq!(switch.runtime().load().version, 0);
    }
}
