//! MCP client over streamable HTTP, using the official rmcp SDK

use std::sync::Arc;

use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, Tool},
    service::RunningService,
    transport::StreamableHttpClientTransport,
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;

use crate::logging::Logger;

/// Auxiliary server and MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation needs a running server
    #[error("Server {0} is not running")]
    NotRunning(String),

    /// Lifecycle failure reported by a server implementation
    #[error("Server {name} failed: {message}")]
    Lifecycle { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    pub fn lifecycle(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lifecycle {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "panel-core".to_string(),
            title: Some("Panel".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Session with one remote MCP server
pub struct McpClient {
    client: RunningService<RoleClient, ClientInfo>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect and initialize over streamable HTTP
    pub async fn connect_http(url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Connecting to {}", url));

        let transport = StreamableHttpClientTransport::from_uri(url);
        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized");
        Ok(Self { client, logger })
    }

    /// Tools the server exposes
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.debug(&format!("[McpClient] Listed {} tools", result.tools.len()));
        Ok(result.tools)
    }

    /// Call a server tool with JSON object arguments
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        self.client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))
    }

    /// Name and version the server reported during initialization
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }

    /// End the session
    pub async fn close(self) -> McpResult<()> {
        self.logger.info("[McpClient] Closing connection");
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}
