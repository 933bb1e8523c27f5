//! Auxiliary server capability interface

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::logging::Logger;

use super::client::{McpClient, McpError, McpResult};
use super::{McpTool, McpToolResult};

/// Status reported by servers that cannot tell
pub const STATUS_UNKNOWN: &str = "unknown";

/// A long-running plugin managed alongside tools
///
/// Every capability has a default, so implementors override only what
/// they support and callers never probe for presence.
#[async_trait]
pub trait AuxiliaryServer: Send + Sync {
    async fn start(&self) -> McpResult<()> {
        Ok(())
    }

    async fn stop(&self) -> McpResult<()> {
        Ok(())
    }

    async fn get_status(&self) -> McpResult<String> {
        Ok(STATUS_UNKNOWN.to_string())
    }

    async fn get_endpoints(&self) -> McpResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn description(&self) -> String {
        String::new()
    }

    fn version(&self) -> String {
        "0.1.0".to_string()
    }
}

/// One row of the auxiliary server report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryServerInfo {
    pub name: String,
    pub status: String,
    pub description: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// A remote MCP server reached over streamable HTTP
///
/// `start` opens the session and `stop` closes it.
pub struct McpHttpServer {
    name: String,
    url: String,
    description: String,
    session: Mutex<Option<McpClient>>,
    logger: Arc<dyn Logger>,
}

impl McpHttpServer {
    pub fn new(name: impl Into<String>, url: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: String::new(),
            session: Mutex::new(None),
            logger,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Tools the connected server exposes
    pub async fn list_tools(&self) -> McpResult<Vec<McpTool>> {
        let session = self.session.lock().await;
        match session.as_ref() {
            Some(client) => client.list_tools().await,
            None => Err(McpError::NotRunning(self.name.clone())),
        }
    }

    /// Call one of the connected server's tools
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> McpResult<McpToolResult> {
        let session = self.session.lock().await;
        match session.as_ref() {
            Some(client) => client.call_tool(tool, arguments).await,
            None => Err(McpError::NotRunning(self.name.clone())),
        }
    }
}

#[async_trait]
impl AuxiliaryServer for McpHttpServer {
    async fn start(&self) -> McpResult<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }
        let client = McpClient::connect_http(&self.url, Arc::clone(&self.logger))
            .await
            .map_err(|e| McpError::ConnectionFailed(format!("{}: {}", self.url, e)))?;
        *session = Some(client);
        Ok(())
    }

    async fn stop(&self) -> McpResult<()> {
        let client = self.session.lock().await.take();
        match client {
            Some(client) => client.close().await,
            None => Ok(()),
        }
    }

    async fn get_status(&self) -> McpResult<String> {
        let running = self.session.lock().await.is_some();
        Ok(if running { "running" } else { "stopped" }.to_string())
    }

    async fn get_endpoints(&self) -> McpResult<Vec<String>> {
        Ok(vec![self.url.clone()])
    }

    fn description(&self) -> String {
        if self.description.is_empty() {
            format!("MCP server at {}", self.url)
        } else {
            self.description.clone()
        }
    }

    fn version(&self) -> String {
        self.session
            .try_lock()
            .ok()
            .and_then(|session| {
                session
                    .as_ref()
                    .and_then(|c| c.server_info().map(|info| info.version.clone()))
            })
            .unwrap_or_else(|| "0.1.0".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    struct Bare;

    #[async_trait]
    impl AuxiliaryServer for Bare {}

    #[tokio::test]
    async fn test_default_capabilities() {
        let server = Bare;
        assert!(server.start().await.is_ok());
        assert!(server.stop().await.is_ok());
        assert_eq!(server.get_status().await.unwrap(), "unknown");
        assert!(server.get_endpoints().await.unwrap().is_empty());
        assert_eq!(server.description(), "");
        assert_eq!(server.version(), "0.1.0");
    }

    #[tokio::test]
    async fn test_http_server_before_start() {
        let server = McpHttpServer::new("files", "http://127.0.0.1:1/mcp", NoOpLogger::shared());
        assert_eq!(server.get_status().await.unwrap(), "stopped");
        assert_eq!(server.get_endpoints().await.unwrap(), vec!["http://127.0.0.1:1/mcp"]);
        assert_eq!(server.description(), "MCP server at http://127.0.0.1:1/mcp");
        assert!(matches!(server.list_tools().await, Err(McpError::NotRunning(_))));
        assert!(matches!(
            server.call_tool("read", serde_json::json!({})).await,
            Err(McpError::NotRunning(_))
        ));
        assert!(server.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_http_server_unreachable_start_fails() {
        let server = McpHttpServer::new("files", "http://127.0.0.1:1/mcp", NoOpLogger::shared());
        let started =
            tokio::time::timeout(std::time::Duration::from_secs(10), server.start()).await;
        if let Ok(result) = started {
            assert!(result.is_err());
        }
        assert_eq!(server.get_status().await.unwrap(), "stopped");
    }
}
