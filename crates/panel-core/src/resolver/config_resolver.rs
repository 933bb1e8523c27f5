//! Environment-driven configuration for the active backend
//!
//! Reads the process environment (through [`EnvSource`]) and produces the
//! per-call [`RuntimeConfig`] a provider policy consumes. Keys:
//!
//! - `PROVIDER`: active backend (`openai`, `ollama`, `deepseek`, `mhw`).
//!   When unset, `USE_LOCAL_MODEL=true` selects `ollama`.
//! - `<P>_MODEL`, `<P>_API_KEY`, `<P>_API_BASE`, `<P>_CONTEXT_WINDOW`,
//!   `<P>_MAX_TOKENS` for each backend prefix `<P>`.
//! - Legacy aliases: `MODEL_NAME`, `CONTEXT_WINDOW`, `MAX_TOKENS` (openai) and
//!   `LOCAL_MODEL_NAME`, `LOCAL_API_BASE`, `LOCAL_CONTEXT_WINDOW`,
//!   `LOCAL_MAX_TOKENS` (ollama).
//! - `VERBOSE`.
//!
//! Numeric values that are present but not positive integers are a hard
//! error: configuration must be well-formed before traffic is served.

use std::sync::Arc;

use crate::config::{flag, positive_u32, ConfigResult, EnvSource, ProcessEnv, SharedEnv};
use crate::logging::SharedLogger;
use crate::providers::backend_defaults;
use crate::types::{BackendId, RuntimeConfig};

/// Where a backend's catalog lives and how to authenticate to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub api_base: String,
    pub api_key: Option<String>,
}

/// Resolves the active backend and its runtime configuration
#[derive(Clone)]
pub struct ConfigurationResolver {
    env: SharedEnv,
    logger: SharedLogger,
}

impl ConfigurationResolver {
    /// Create a resolver over any environment source
    pub fn new(env: SharedEnv, logger: SharedLogger) -> Self {
        Self { env, logger }
    }

    /// Create a resolver over the process environment
    pub fn from_process_env(logger: SharedLogger) -> Self {
        Self::new(Arc::new(ProcessEnv), logger)
    }

    /// The environment source this resolver reads
    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Backend selected by the environment
    ///
    /// An unrecognised `PROVIDER` value is logged and treated as the
    /// hosted-primary backend.
    pub fn active_backend(&self) -> BackendId {
        match self.string("PROVIDER") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                self.logger.warn(&format!(
                    "[ConfigurationResolver] {}; using {}",
                    err,
                    BackendId::OpenAi
                ));
                BackendId::OpenAi
            }),
            None if flag(self.env(), "USE_LOCAL_MODEL") == Some(true) => BackendId::Ollama,
            None => BackendId::OpenAi,
        }
    }

    /// Resolve the active backend (or `active_override`) and its config
    pub fn resolve(
        &self,
        active_override: Option<BackendId>,
    ) -> ConfigResult<(BackendId, RuntimeConfig)> {
        self.resolve_with(active_override, None)
    }

    /// Like [`resolve`](Self::resolve), with an optional model override
    pub fn resolve_with(
        &self,
        active_override: Option<BackendId>,
        model_override: Option<&str>,
    ) -> ConfigResult<(BackendId, RuntimeConfig)> {
        let backend = active_override.unwrap_or_else(|| self.active_backend());
        let config = self.resolve_for(backend, model_override)?;
        Ok((backend, config))
    }

    /// Build the runtime config for one backend
    pub fn resolve_for(
        &self,
        backend: BackendId,
        model_override: Option<&str>,
    ) -> ConfigResult<RuntimeConfig> {
        let defaults = backend_defaults(backend);
        let keys = EnvKeys::for_backend(backend);

        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.first_string(&keys.model))
            .unwrap_or_else(|| defaults.model.to_string());

        let endpoint = self.endpoint(backend);

        Ok(RuntimeConfig {
            offline: backend.is_local(),
            model: Some(model),
            api_key: endpoint.api_key,
            api_base: Some(endpoint.api_base),
            context_window: self.first_number(&keys.context_window)?,
            max_tokens: self.first_number(&keys.max_tokens)?,
            verbose: flag(self.env(), "VERBOSE"),
        })
    }

    /// Catalog endpoint and credentials for a backend
    pub fn endpoint(&self, backend: BackendId) -> ProviderEndpoint {
        let keys = EnvKeys::for_backend(backend);
        let api_base = self
            .first_string(&keys.api_base)
            .unwrap_or_else(|| backend_defaults(backend).api_base.to_string());
        let api_key = keys.api_key.as_deref().and_then(|k| self.string(k));
        ProviderEndpoint { api_base, api_key }
    }

    fn string(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn first_string(&self, keys: &[String]) -> Option<String> {
        keys.iter().find_map(|k| self.string(k))
    }

    fn first_number(&self, keys: &[String]) -> ConfigResult<Option<u32>> {
        for key in keys {
            if let Some(n) = positive_u32(self.env(), key)? {
                return Ok(Some(n));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("active_backend", &self.active_backend())
            .finish()
    }
}

/// Environment keys for one backend, in lookup order
struct EnvKeys {
    model: Vec<String>,
    api_key: Option<String>,
    api_base: Vec<String>,
    context_window: Vec<String>,
    max_tokens: Vec<String>,
}

impl EnvKeys {
    fn for_backend(backend: BackendId) -> Self {
        let p = backend.env_prefix();
        let mut keys = Self {
            model: vec![format!("{p}_MODEL")],
            api_key: (!backend.is_local()).then(|| format!("{p}_API_KEY")),
            api_base: vec![format!("{p}_API_BASE")],
            context_window: vec![format!("{p}_CONTEXT_WINDOW")],
            max_tokens: vec![format!("{p}_MAX_TOKENS")],
        };

        match backend {
            BackendId::OpenAi => {
                keys.model.push("MODEL_NAME".to_string());
                keys.context_window.push("CONTEXT_WINDOW".to_string());
                keys.max_tokens.push("MAX_TOKENS".to_string());
            }
            BackendId::Ollama => {
                keys.model.push("LOCAL_MODEL_NAME".to_string());
                keys.api_base.push("LOCAL_API_BASE".to_string());
                keys.context_window.push("LOCAL_CONTEXT_WINDOW".to_string());
                keys.max_tokens.push("LOCAL_MAX_TOKENS".to_string());
            }
            BackendId::DeepSeek | BackendId::Mhw => {}
        }

        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use std::collections::HashMap;

    fn resolver(pairs: &[(&str, &str)]) -> ConfigurationResolver {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigurationResolver::new(Arc::new(env), NoOpLogger::shared())
    }

    #[test]
    fn test_defaults_select_hosted_primary() {
        let (backend, config) = resolver(&[]).resolve(None).unwrap();
        assert_eq!(backend, BackendId::OpenAi);
        assert!(!config.offline);
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.api_base.as_deref(), Some("https://api.openai.com/v1"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.context_window, None);
        assert_eq!(config.verbose, None);
    }

    #[test]
    fn test_provider_env_selects_backend() {
        let (backend, config) = resolver(&[("PROVIDER", "ollama")]).resolve(None).unwrap();
        assert_eq!(backend, BackendId::Ollama);
        assert!(config.offline);
        assert_eq!(config.model.as_deref(), Some("llama3"));
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_use_local_model_flag() {
        let r = resolver(&[("USE_LOCAL_MODEL", "true")]);
        assert_eq!(r.active_backend(), BackendId::Ollama);

        let r = resolver(&[("USE_LOCAL_MODEL", "true"), ("PROVIDER", "mhw")]);
        assert_eq!(r.active_backend(), BackendId::Mhw);
    }

    #[test]
    fn test_unknown_provider_falls_back_with_warning() {
        let logger = Arc::new(MemoryLogger::new());
        let mut env = HashMap::new();
        env.insert("PROVIDER".to_string(), "nonsense".to_string());
        let r = ConfigurationResolver::new(Arc::new(env), logger.clone());

        assert_eq!(r.active_backend(), BackendId::OpenAi);
        assert!(logger.contains(LogLevel::Warn, "nonsense"));
    }

    #[test]
    fn test_override_beats_environment() {
        let r = resolver(&[("PROVIDER", "ollama"), ("DEEPSEEK_MODEL", "deepseek-coder")]);
        let (backend, config) = r.resolve(Some(BackendId::DeepSeek)).unwrap();
        assert_eq!(backend, BackendId::DeepSeek);
        assert_eq!(config.model.as_deref(), Some("deepseek-coder"));

        let (_, config) = r
            .resolve_with(Some(BackendId::DeepSeek), Some("deepseek-reasoner"))
            .unwrap();
        assert_eq!(config.model.as_deref(), Some("deepseek-reasoner"));
    }

    #[test]
    fn test_prefixed_keys() {
        let r = resolver(&[
            ("MHW_API_KEY", "sk-mhw"),
            ("MHW_API_BASE", "https://mhw.example/api"),
            ("MHW_CONTEXT_WINDOW", "32000"),
            ("MHW_MAX_TOKENS", "2048"),
            ("VERBOSE", "TRUE"),
        ]);
        let config = r.resolve_for(BackendId::Mhw, None).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-mhw"));
        assert_eq!(config.api_base.as_deref(), Some("https://mhw.example/api"));
        assert_eq!(config.context_window, Some(32000));
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn test_legacy_aliases() {
        let r = resolver(&[
            ("MODEL_NAME", "gpt-4-turbo"),
            ("CONTEXT_WINDOW", "12000"),
            ("LOCAL_MODEL_NAME", "mistral"),
            ("LOCAL_MAX_TOKENS", "1000"),
        ]);
        let openai = r.resolve_for(BackendId::OpenAi, None).unwrap();
        assert_eq!(openai.model.as_deref(), Some("gpt-4-turbo"));
        assert_eq!(openai.context_window, Some(12000));

        let ollama = r.resolve_for(BackendId::Ollama, None).unwrap();
        assert_eq!(ollama.model.as_deref(), Some("mistral"));
        assert_eq!(ollama.max_tokens, Some(1000));
        assert_eq!(ollama.api_key, None);
    }

    #[test]
    fn test_prefixed_key_wins_over_alias() {
        let r = resolver(&[("OPENAI_MODEL", "gpt-4"), ("MODEL_NAME", "gpt-3.5-turbo")]);
        let config = r.resolve_for(BackendId::OpenAi, None).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let r = resolver(&[("PROVIDER", "deepseek"), ("DEEPSEEK_MAX_TOKENS", "many")]);
        let err = r.resolve(None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { ref key, .. } if key == "DEEPSEEK_MAX_TOKENS"
        ));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let r = resolver(&[("OPENAI_MODEL", "  "), ("OPENAI_API_KEY", "")]);
        let config = r.resolve_for(BackendId::OpenAi, None).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_endpoint() {
        let r = resolver(&[("DEEPSEEK_API_KEY", "sk-ds")]);
        let endpoint = r.endpoint(BackendId::DeepSeek);
        assert_eq!(endpoint.api_base, "https://api.deepseek.com/v1");
        assert_eq!(endpoint.api_key.as_deref(), Some("sk-ds"));
    }
}
