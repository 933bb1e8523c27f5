//! Provider error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::{BackendId, UnknownBackend};

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Backend identifier outside the known set
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Model id absent from the backend's current catalog
    #[error("Model not found for {backend}: {model}")]
    ModelNotFound { backend: BackendId, model: String },

    /// API request returned a non-success status
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload did not have the expected shape
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Configuration could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a model-not-found error
    pub fn model_not_found(backend: BackendId, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            backend,
            model: model.into(),
        }
    }

    /// Whether the caller sent something invalid (4xx) rather than the
    /// system failing (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownProvider(_) | Self::ModelNotFound { .. })
    }
}

impl From<UnknownBackend> for ProviderError {
    fn from(err: UnknownBackend) -> Self {
        Self::UnknownProvider(err.0)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
