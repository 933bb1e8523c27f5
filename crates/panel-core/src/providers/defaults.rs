//! Per-backend default values

use crate::logging::Logger;
use crate::types::BackendId;

/// Namespace token the local runtime expects in front of model ids
pub const OLLAMA_NAMESPACE: &str = "ollama/";

/// Defaults applied when neither the environment nor the caller sets a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendDefaults {
    pub model: &'static str,
    pub api_base: &'static str,
    pub context_window: u32,
    pub max_tokens: u32,
    pub verbose: bool,
    pub requires_api_key: bool,
}

/// Context window and max tokens for DeepSeek coder models
pub const DEEPSEEK_CODER_BUDGET: (u32, u32) = (16000, 8000);

/// Look up the defaults for a backend
pub fn backend_defaults(backend: BackendId) -> BackendDefaults {
    match backend {
        BackendId::OpenAi => BackendDefaults {
            model: "gpt-4o",
            api_base: "https://api.openai.com/v1",
            context_window: 10000,
            max_tokens: 4096,
            verbose: false,
            requires_api_key: true,
        },
        BackendId::Ollama => BackendDefaults {
            model: "llama3",
            api_base: "http://localhost:11434",
            context_window: 4000,
            max_tokens: 3000,
            verbose: true,
            requires_api_key: false,
        },
        BackendId::DeepSeek => BackendDefaults {
            model: "deepseek-chat",
            api_base: "https://api.deepseek.com/v1",
            context_window: 8192,
            max_tokens: 4096,
            verbose: false,
            requires_api_key: true,
        },
        BackendId::Mhw => BackendDefaults {
            model: "default",
            api_base: "https://chat.musicheardworldwide.com/api",
            context_window: 8192,
            max_tokens: 4096,
            verbose: false,
            requires_api_key: true,
        },
    }
}

/// The requested model, or `default` when absent or blank
pub(crate) fn model_or_default(
    requested: Option<&str>,
    default: &str,
    component: &str,
    logger: &dyn Logger,
) -> String {
    match requested.map(str::trim) {
        Some(model) if !model.is_empty() => model.to_string(),
        Some(_) => {
            logger.warn(&format!(
                "[{}] Empty model id, using default {}",
                component, default
            ));
            default.to_string()
        }
        None => default.to_string(),
    }
}

/// The requested token budget, or `default` when absent or zero
pub(crate) fn budget_or_default(
    requested: Option<u32>,
    default: u32,
    field: &str,
    component: &str,
    logger: &dyn Logger,
) -> u32 {
    match requested {
        Some(0) => {
            logger.warn(&format!(
                "[{}] {} must be positive, using default {}",
                component, field, default
            ));
            default
        }
        Some(n) => n,
        None => default,
    }
}
