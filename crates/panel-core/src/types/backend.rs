//! Backend identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the interchangeable language-model services
///
/// The set is closed: every match over it is exhaustive, so adding a backend
/// forces every policy table to be updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Hosted commercial API (primary)
    #[default]
    OpenAi,
    /// Locally-run model server
    Ollama,
    /// Hosted chat service with chat and coder models
    DeepSeek,
    /// Hosted chat service behind a vendor endpoint
    Mhw,
}

impl BackendId {
    /// Every backend, hosted-primary first
    pub const ALL: [BackendId; 4] = [
        BackendId::OpenAi,
        BackendId::Ollama,
        BackendId::DeepSeek,
        BackendId::Mhw,
    ];

    /// Wire identifier (`openai`, `ollama`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::OpenAi => "openai",
            BackendId::Ollama => "ollama",
            BackendId::DeepSeek => "deepseek",
            BackendId::Mhw => "mhw",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendId::OpenAi => "OpenAI",
            BackendId::Ollama => "Ollama",
            BackendId::DeepSeek => "DeepSeek",
            BackendId::Mhw => "Music Heard Worldwide",
        }
    }

    /// Prefix of the backend's environment keys (`OPENAI_MODEL`, ...)
    pub fn env_prefix(&self) -> &'static str {
        match self {
            BackendId::OpenAi => "OPENAI",
            BackendId::Ollama => "OLLAMA",
            BackendId::DeepSeek => "DEEPSEEK",
            BackendId::Mhw => "MHW",
        }
    }

    /// Whether the backend runs on the local machine
    pub fn is_local(&self) -> bool {
        matches!(self, BackendId::Ollama)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown provider: {}", self.0)
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for BackendId {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(BackendId::OpenAi),
            "ollama" => Ok(BackendId::Ollama),
            "deepseek" => Ok(BackendId::DeepSeek),
            "mhw" => Ok(BackendId::Mhw),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}
