//! Tool error types

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while acquiring, loading or invoking tools
#[derive(Error, Debug)]
pub enum ToolError {
    /// Shallow clone exited non-zero or timed out
    #[error("Failed to clone {url}: {stderr}")]
    Clone { url: String, stderr: String },

    /// Path does not follow the tool convention, or describing it failed
    #[error("Failed to load tool from {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// Repository reference that cannot name a tool
    #[error("Invalid tool source: {0}")]
    InvalidSource(String),

    /// A tool function ran and failed
    #[error("Tool function {function} failed: {message}")]
    Invocation { function: String, message: String },

    /// No registered tool exposes this namespaced function
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// Background acquisition task panicked or was cancelled
    #[error("Tool worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Create a load error
    pub fn load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create an invocation error
    pub fn invocation(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Whether the caller sent something invalid (4xx) rather than the
    /// system failing (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidSource(_) | Self::FunctionNotFound(_))
    }
}

pub type ToolsResult<T> = Result<T, ToolError>;
