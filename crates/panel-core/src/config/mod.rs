//! Configuration sources
//!
//! - `EnvSource`: environment-style lookups (process env or a fixed map)
//! - `FileSettings`: YAML settings file (~/.config/panel/config.yaml)

mod traits;
mod file;

pub use traits::{flag, positive_u32, ConfigError, ConfigResult, EnvSource, ProcessEnv, SharedEnv};
pub use file::{
    default_tools_dir, DiscoverySettings, FileSettings, PanelSettings, SettingsFile,
    DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_DISCOVERY_API_BASE, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_TOOL_TIMEOUT_SECS,
};
