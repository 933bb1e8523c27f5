//! Crate-wide error type and the structured error payload

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::McpError;
use crate::providers::ProviderError;
use crate::tools::ToolError;

/// Any failure a host surface may need to report
#[derive(Error, Debug)]
pub enum PanelError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mcp(#[from] McpError),
}

impl PanelError {
    /// HTTP-style status for this error
    ///
    /// Bad identifiers and sources are the caller's fault (4xx); everything
    /// else is a server-side failure (5xx).
    pub fn status_code(&self) -> u16 {
        match self {
            PanelError::Provider(ProviderError::ModelNotFound { .. })
            | PanelError::Tool(ToolError::FunctionNotFound(_)) => 404,
            PanelError::Provider(e) if e.is_client_error() => 400,
            PanelError::Tool(e) if e.is_client_error() => 400,
            _ => 500,
        }
    }

    /// The structured payload reported to callers
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
            status: self.status_code(),
        }
    }
}

/// Error body with a message and a non-2xx status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub status: u16,
}

impl From<&PanelError> for ErrorPayload {
    fn from(err: &PanelError) -> Self {
        err.payload()
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
