//! File-based settings (YAML)
//!
//! User-level settings live at `~/.config/panel/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult, EnvSource};

/// Default HTTP timeout for catalog and discovery calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default deadline for a tool's `describe` and each function call
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
/// Default timeout for cloning a tool repository
pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 120;
/// Default code-hosting API
pub const DEFAULT_DISCOVERY_API_BASE: &str = "https://api.github.com";

/// Settings file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SettingsFile {
    /// Root directory for cloned tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_dir: Option<PathBuf>,

    /// Timeout for catalog and discovery HTTP calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Timeout for `git clone`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_timeout_secs: Option<u64>,

    /// Timeout for running a tool's `describe` or one of its functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,

    /// Repository discovery settings
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

/// Repository discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySettings {
    /// Code-hosting API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Language filter applied to every search
    #[serde(default = "default_language")]
    pub language: String,
    /// Result count used when the caller does not ask for one
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_api_base() -> String {
    DEFAULT_DISCOVERY_API_BASE.to_string()
}

fn default_language() -> String {
    "python".to_string()
}

fn default_max_results() -> u32 {
    10
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            language: default_language(),
            max_results: default_max_results(),
        }
    }
}

/// Settings after applying environment overrides and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSettings {
    pub tools_dir: PathBuf,
    pub http_timeout: Duration,
    pub clone_timeout: Duration,
    pub tool_timeout: Duration,
    pub discovery: DiscoverySettings,
    /// Token for the code-hosting API (`GITHUB_TOKEN`)
    pub github_token: Option<String>,
}

impl PanelSettings {
    /// Merge a settings file with the environment
    ///
    /// `PANEL_TOOLS_DIR` overrides `tools_dir`; `GITHUB_TOKEN` supplies the
    /// discovery token.
    pub fn resolve(file: &SettingsFile, env: &dyn EnvSource) -> Self {
        let tools_dir = env
            .get("PANEL_TOOLS_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| file.tools_dir.clone())
            .unwrap_or_else(default_tools_dir);

        Self {
            tools_dir,
            http_timeout: Duration::from_secs(
                file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            clone_timeout: Duration::from_secs(
                file.clone_timeout_secs.unwrap_or(DEFAULT_CLONE_TIMEOUT_SECS),
            ),
            tool_timeout: Duration::from_secs(
                file.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            ),
            discovery: file.discovery.clone(),
            github_token: env.get("GITHUB_TOKEN").filter(|t| !t.is_empty()),
        }
    }
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self::resolve(&SettingsFile::default(), &std::collections::HashMap::<String, String>::new())
    }
}

/// Default per-installation tools root: `<home>/.panel/tools`
pub fn default_tools_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".panel")
        .join("tools")
}

/// Settings file reader/writer
///
/// # Example
///
/// ```no_run
/// use panel_core::config::FileSettings;
///
/// let settings = FileSettings::user();
/// let file = settings.get().unwrap_or_default();
/// ```
pub struct FileSettings {
    path: PathBuf,
    cache: RwLock<Option<SettingsFile>>,
}

impl FileSettings {
    /// Create a settings reader for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// User-level settings (~/.config/panel/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("panel").join("config.yaml"))
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the settings file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<SettingsFile> {
        if !self.path.exists() {
            return Ok(SettingsFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SettingsFile::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Yaml(format!("Failed to parse {}: {}", self.path.display(), e)))
    }

    /// Cached settings, loading from disk on first use
    pub fn get(&self) -> ConfigResult<SettingsFile> {
        if let Some(settings) = self.cache.read().as_ref() {
            return Ok(settings.clone());
        }

        let settings = self.load()?;
        *self.cache.write() = Some(settings.clone());
        Ok(settings)
    }

    /// Reload settings from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<SettingsFile> {
        let settings = self.load()?;
        *self.cache.write() = Some(settings.clone());
        Ok(settings)
    }

    /// Write settings to disk
    pub fn save(&self, settings: &SettingsFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(settings)
            .map_err(|e| ConfigError::Yaml(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(settings.clone());
        Ok(())
    }
}

impl std::fmt::Debug for FileSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSettings")
            .field("path", &self.path)
            .field("exists", &self.exists())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = FileSettings::new(dir.path().join("config.yaml"));
        assert!(!settings.exists());
        assert_eq!(settings.get().unwrap(), SettingsFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let settings = FileSettings::new(&path);

        let file = SettingsFile {
            tools_dir: Some(PathBuf::from("/srv/panel/tools")),
            http_timeout_secs: Some(10),
            ..Default::default()
        };
        settings.save(&file).unwrap();
        assert!(settings.exists());

        let reloaded = FileSettings::new(&path).reload().unwrap();
        assert_eq!(reloaded, file);
        assert_eq!(reloaded.discovery.language, "python");
    }

    #[test]
    fn test_partial_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "discovery:\n  language: rust\n").unwrap();

        let file = FileSettings::new(&path).get().unwrap();
        assert_eq!(file.discovery.language, "rust");
        assert_eq!(file.discovery.api_base, DEFAULT_DISCOVERY_API_BASE);
        assert_eq!(file.discovery.max_results, 10);
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "tools_dir: [unclosed").unwrap();
        assert!(matches!(FileSettings::new(&path).get(), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_resolve_applies_env_overrides() {
        let file = SettingsFile {
            tools_dir: Some(PathBuf::from("/from/file")),
            clone_timeout_secs: Some(5),
            ..Default::default()
        };
        let mut env = HashMap::new();
        env.insert("PANEL_TOOLS_DIR".to_string(), "/from/env".to_string());
        env.insert("GITHUB_TOKEN".to_string(), "ghp_test".to_string());

        let settings = PanelSettings::resolve(&file, &env);
        assert_eq!(settings.tools_dir, PathBuf::from("/from/env"));
        assert_eq!(settings.clone_timeout, Duration::from_secs(5));
        assert_eq!(settings.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert_eq!(settings.tool_timeout, Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS));
        assert_eq!(settings.github_token.as_deref(), Some("ghp_test"));
    }

    #[test]
    fn test_tool_timeout_is_independent_of_http_timeout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "http_timeout_secs: 5\ntool_timeout_secs: 90\n").unwrap();

        let file = FileSettings::new(&path).get().unwrap();
        let settings = PanelSettings::resolve(&file, &HashMap::<String, String>::new());
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
        assert_eq!(settings.tool_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_default_tools_dir_is_under_home() {
        let dir = default_tools_dir();
        assert!(dir.ends_with(".panel/tools"));
    }
}
