//! Tool manager facade
//!
//! Wires discovery, acquisition, loading and the registry together. A tool
//! is registered only after it has been fully loaded, so a failed add never
//! leaves a partial entry behind.

use std::path::Path;
use std::sync::Arc;

use crate::config::PanelSettings;
use crate::logging::Logger;
use crate::types::RepositoryCandidate;

use super::acquisition::ToolAcquisition;
use super::discovery::RepositoryDiscovery;
use super::error::{ToolError, ToolsResult};
use super::loader::{LoadedTool, ToolLoader};
use super::registry::ToolRegistry;

pub struct ToolManager {
    registry: Arc<ToolRegistry>,
    loader: Arc<ToolLoader>,
    acquisition: Arc<ToolAcquisition>,
    discovery: Arc<RepositoryDiscovery>,
    default_max_results: u32,
    logger: Arc<dyn Logger>,
}

impl ToolManager {
    /// Build every component from resolved settings
    pub fn new(settings: &PanelSettings, client: reqwest::Client, logger: Arc<dyn Logger>) -> Self {
        let loader = Arc::new(ToolLoader::new(Arc::clone(&logger)).with_timeout(settings.tool_timeout));
        let acquisition = ToolAcquisition::new(
            settings.tools_dir.clone(),
            Arc::clone(&loader),
            Arc::clone(&logger),
        )
        .with_clone_timeout(settings.clone_timeout);
        let discovery = RepositoryDiscovery::new(
            client,
            &settings.discovery,
            settings.github_token.clone(),
            Arc::clone(&logger),
        );

        Self {
            registry: Arc::new(ToolRegistry::new(Arc::clone(&logger))),
            loader,
            acquisition: Arc::new(acquisition),
            discovery: Arc::new(discovery),
            default_max_results: settings.discovery.max_results,
            logger,
        }
    }

    /// Swap in a differently configured acquisition step
    pub fn with_acquisition(mut self, acquisition: ToolAcquisition) -> Self {
        self.acquisition = Arc::new(acquisition);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn loader(&self) -> &Arc<ToolLoader> {
        &self.loader
    }

    pub fn discovery(&self) -> &Arc<RepositoryDiscovery> {
        &self.discovery
    }

    /// Search for tool repositories; `None` uses the configured default count
    pub async fn search_tools(
        &self,
        query: &str,
        tags: &[String],
        max_results: Option<u32>,
    ) -> Vec<RepositoryCandidate> {
        self.discovery
            .search(query, tags, max_results.unwrap_or(self.default_max_results))
            .await
    }

    /// Load a local tool and register it
    pub async fn add_tool_from_path(&self, path: &Path, name: Option<&str>) -> ToolsResult<Arc<LoadedTool>> {
        let tool = self.loader.load_from_path(path, name).await?;
        Ok(self.registry.register_tool(tool))
    }

    /// Clone a repository, load it and register it
    ///
    /// The clone and load run on their own task so a slow clone does not
    /// stall the caller's executor thread.
    pub async fn add_tool_from_repository(
        &self,
        repo_url: &str,
        branch: Option<&str>,
    ) -> ToolsResult<Arc<LoadedTool>> {
        let acquisition = Arc::clone(&self.acquisition);
        let url = repo_url.to_string();
        let branch = branch.map(str::to_string);

        let handle = tokio::spawn(async move {
            acquisition
                .acquire_from_repository(&url, branch.as_deref())
                .await
        });

        let tool = handle.await.map_err(|e| {
            crate::log_error!(self.logger, "[ToolManager] Acquisition task failed: {}", e);
            ToolError::Worker(e.to_string())
        })??;

        Ok(self.registry.register_tool(tool))
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("registry", &self.registry)
            .field("acquisition", &self.acquisition)
            .field("discovery", &self.discovery)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{DiscoverySettings, SettingsFile};
    use crate::logging::NoOpLogger;
    use crate::tools::acquisition::tests::{fake_git, CLONE_OK};
    use crate::tools::loader::tests::write_manifest_tool;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn manager(root: &Path) -> ToolManager {
        let file = SettingsFile {
            tools_dir: Some(root.to_path_buf()),
            discovery: DiscoverySettings {
                api_base: "http://127.0.0.1:1".to_string(),
                ..DiscoverySettings::default()
            },
            ..SettingsFile::default()
        };
        let settings = PanelSettings::resolve(&file, &HashMap::<String, String>::new());
        ToolManager::new(&settings, reqwest::Client::new(), NoOpLogger::shared())
    }

    #[tokio::test]
    async fn test_add_tool_from_path_registers_functions() {
        let dir = tempfile::tempdir().unwrap();
        let tool_dir = dir.path().join("weather");
        write_manifest_tool(&tool_dir);

        let manager = manager(&dir.path().join("tools"));
        let tool = manager.add_tool_from_path(&tool_dir, None).await.unwrap();

        assert_eq!(tool.name, "weather");
        let names: Vec<_> = manager
            .registry()
            .get_tool_functions()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["weather_forecast", "weather_plain"]);

        let result = manager
            .registry()
            .call_function("weather_forecast", json!({"city": "Lima"}))
            .await
            .unwrap();
        assert_eq!(result["args"]["city"], "Lima");
    }

    #[tokio::test]
    async fn test_failed_add_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir.path().join("tools"));

        assert!(manager.add_tool_from_path(dir.path(), None).await.is_err());
        assert_eq!(manager.registry().tool_count(), 0);
    }

    #[tokio::test]
    async fn test_add_tool_from_repository_runs_on_worker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let git = fake_git(dir.path(), CLONE_OK);

        let base = manager(&root);
        let acquisition = ToolAcquisition::new(&root, Arc::clone(base.loader()), NoOpLogger::shared())
            .with_git_command(git)
            .with_clone_timeout(Duration::from_secs(10));
        let manager = base.with_acquisition(acquisition);

        let tool = manager
            .add_tool_from_repository("https://github.com/acme/weather-tool.git", None)
            .await
            .unwrap();

        assert_eq!(tool.name, "weather-tool");
        assert!(manager.registry().get_tool("weather-tool").is_some());
        assert_eq!(manager.registry().get_tool_functions()[0].name, "weather-tool_forecast");
    }

    #[test]
    fn test_tool_timeout_comes_from_its_own_setting() {
        let file = SettingsFile {
            http_timeout_secs: Some(3),
            tool_timeout_secs: Some(45),
            ..SettingsFile::default()
        };
        let settings = PanelSettings::resolve(&file, &HashMap::<String, String>::new());
        let manager = ToolManager::new(&settings, reqwest::Client::new(), NoOpLogger::shared());
        assert_eq!(manager.loader().timeout(), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_search_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        assert!(manager.search_tools("weather", &[], None).await.is_empty());
    }
}
