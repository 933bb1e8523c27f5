//! Runtime configuration records

use serde::{Deserialize, Serialize};

/// Per-call configuration handed to a provider policy
///
/// Produced by the configuration resolver for one configure call and never
/// mutated afterwards. Numeric budgets and verbosity are optional: `None`
/// means "use the backend's default", which lets a policy derive defaults
/// from the chosen model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Whether the backend runs without network access to a hosted API
    pub offline: bool,
    /// Requested model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key for authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Context window in tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Verbose engine output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl RuntimeConfig {
    /// Create an empty config (all backend defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the context window
    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = Some(tokens);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set verbosity
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }
}

/// The LLM-runtime settings the chat engine executes with
///
/// Every configure call builds a complete value; nothing carries over from
/// the previously active backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub offline: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// `None` means the engine's built-in endpoint for the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub context_window: u32,
    pub max_tokens: u32,
    pub auto_run: bool,
    pub verbose: bool,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            offline: false,
            model: "gpt-4o".to_string(),
            api_key: None,
            api_base: None,
            context_window: 10000,
            max_tokens: 4096,
            auto_run: true,
            verbose: false,
        }
    }
}
