//! Configuration sources and errors

use std::collections::HashMap;
use std::sync::Arc;

/// Read access to environment-style key/value configuration
///
/// Implementations:
/// - `ProcessEnv`: the real process environment
/// - `HashMap<String, String>`: fixed values (tests, embedding hosts)
pub trait EnvSource: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Type alias for a shared environment source
pub type SharedEnv = Arc<dyn EnvSource>;

/// Errors that can occur while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: expected a positive integer, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file error: {0}")]
    Yaml(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read a positive integer, `Ok(None)` when the key is unset
pub fn positive_u32(env: &dyn EnvSource, key: &str) -> ConfigResult<Option<u32>> {
    match env.get(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::InvalidNumber {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}

/// Read a boolean flag (`true`, case-insensitive), `None` when unset
pub fn flag(env: &dyn EnvSource, key: &str) -> Option<bool> {
    env.get(key).map(|v| v.trim().eq_ignore_ascii_case("true"))
}
