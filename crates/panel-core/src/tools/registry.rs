//! Tool registry
//!
//! The ToolRegistry holds:
//! - every loaded tool, keyed by name (last write wins, insertion order kept)
//! - every registered auxiliary server, keyed by name
//!
//! It produces the unified function-calling schema, runs function calls
//! requested by the chat engine, and drives auxiliary server lifecycles.
//! Server failures are always contained: they are logged and never abort
//! listing, starting or stopping the other servers.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::logging::Logger;
use crate::mcp::{AuxiliaryServer, AuxiliaryServerInfo, STATUS_UNKNOWN};
use crate::types::{FunctionSchema, ToolCall, ToolResult};

use super::error::{ToolError, ToolsResult};
use super::loader::LoadedTool;

/// Registered auxiliary server
struct ServerEntry {
    name: String,
    server: Arc<dyn AuxiliaryServer>,
}

/// In-memory registry of loaded tools and auxiliary servers
pub struct ToolRegistry {
    tools: RwLock<Vec<Arc<LoadedTool>>>,
    servers: RwLock<Vec<ServerEntry>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            servers: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Add a fully loaded tool, replacing any tool with the same name
    pub fn register_tool(&self, tool: LoadedTool) -> Arc<LoadedTool> {
        let tool = Arc::new(tool);
        let replaced = {
            let mut tools = self.tools.write();
            match tools.iter_mut().find(|t| t.name == tool.name) {
                Some(slot) => {
                    *slot = Arc::clone(&tool);
                    true
                }
                None => {
                    tools.push(Arc::clone(&tool));
                    false
                }
            }
        };

        self.logger.info(&format!(
            "[ToolRegistry] {} tool {} from {}",
            if replaced { "Replaced" } else { "Added" },
            tool.name,
            tool.source_path.display()
        ));
        tool
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<LoadedTool>> {
        self.tools.read().iter().find(|t| t.name == name).cloned()
    }

    /// All tools in registration order
    pub fn tools(&self) -> Vec<Arc<LoadedTool>> {
        self.tools.read().clone()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Function-calling schema for every loaded function
    ///
    /// Names are `<tool>_<function>`; order follows tool registration, then
    /// function declaration. Names are unique: when two tools flatten to the
    /// same name the earlier registration keeps it and the later entry is
    /// skipped with a warning, matching what `call_function` routes to.
    pub fn get_tool_functions(&self) -> Vec<FunctionSchema> {
        let tools = self.tools.read();
        let mut seen = HashSet::new();
        let mut schemas = Vec::new();
        for tool in tools.iter() {
            for schema in tool.schemas() {
                if seen.insert(schema.name.clone()) {
                    schemas.push(schema);
                } else {
                    self.logger.warn(&format!(
                        "[ToolRegistry] Skipping {} from tool {}: name already taken",
                        schema.name, tool.name
                    ));
                }
            }
        }
        schemas
    }

    /// Run a function by its namespaced name
    pub async fn call_function(&self, name: &str, args: Value) -> ToolsResult<Value> {
        let (tool, function) = self
            .find_function(name)
            .ok_or_else(|| ToolError::FunctionNotFound(name.to_string()))?;

        self.logger.info(&format!("[ToolRegistry] Calling function: {}", name));

        match tool.function(&function) {
            Some(f) => f.invoke(args).await,
            None => Err(ToolError::FunctionNotFound(name.to_string())),
        }
    }

    /// Execute a tool call requested by the chat engine
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        match self.call_function(&tool_call.name, tool_call.input.clone()).await {
            Ok(Value::String(text)) => ToolResult::success(&tool_call.id, text),
            Ok(value) => ToolResult::success(&tool_call.id, value.to_string()),
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolRegistry] Function {} failed: {}",
                    tool_call.name, e
                ));
                ToolResult::error(&tool_call.id, format!("Error: {}", e))
            }
        }
    }

    /// Execute several tool calls in order
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            results.push(self.execute_tool_call(call).await);
        }
        results
    }

    fn find_function(&self, namespaced: &str) -> Option<(Arc<LoadedTool>, String)> {
        self.tools.read().iter().find_map(|tool| {
            tool.functions()
                .iter()
                .find(|f| tool.namespaced(f) == namespaced)
                .map(|f| (Arc::clone(tool), f.name.clone()))
        })
    }

    /// Register an auxiliary server and start it
    ///
    /// A start failure is logged; the server is registered either way.
    pub async fn register_mcp_server(&self, name: &str, server: Arc<dyn AuxiliaryServer>) {
        {
            let mut servers = self.servers.write();
            let entry = ServerEntry {
                name: name.to_string(),
                server: Arc::clone(&server),
            };
            match servers.iter_mut().find(|s| s.name == name) {
                Some(slot) => *slot = entry,
                None => servers.push(entry),
            }
        }

        match server.start().await {
            Ok(()) => self
                .logger
                .info(&format!("[ToolRegistry] Started auxiliary server: {}", name)),
            Err(e) => self.logger.error(&format!(
                "[ToolRegistry] Failed to start auxiliary server {}: {}",
                name, e
            )),
        }
    }

    pub fn server_count(&self) -> usize {
        self.servers.read().len()
    }

    /// Start every server; failures are logged per server
    pub async fn start_all_mcp_servers(&self) {
        for (name, server) in self.server_handles() {
            if let Err(e) = server.start().await {
                self.logger.error(&format!(
                    "[ToolRegistry] Failed to start auxiliary server {}: {}",
                    name, e
                ));
            }
        }
    }

    /// Stop every server; failures are logged per server
    pub async fn stop_all_mcp_servers(&self) {
        for (name, server) in self.server_handles() {
            match server.stop().await {
                Ok(()) => self
                    .logger
                    .info(&format!("[ToolRegistry] Stopped auxiliary server: {}", name)),
                Err(e) => self.logger.error(&format!(
                    "[ToolRegistry] Failed to stop auxiliary server {}: {}",
                    name, e
                )),
            }
        }
    }

    /// Status report for every server
    ///
    /// A failing status or endpoint query degrades to `unknown` or empty.
    pub async fn get_mcp_server_info(&self) -> Vec<AuxiliaryServerInfo> {
        let mut report = Vec::new();
        for (name, server) in self.server_handles() {
            let status = server.get_status().await.unwrap_or_else(|e| {
                self.logger.warn(&format!(
                    "[ToolRegistry] Status of {} unavailable: {}",
                    name, e
                ));
                STATUS_UNKNOWN.to_string()
            });
            let endpoints = server.get_endpoints().await.unwrap_or_else(|e| {
                self.logger.warn(&format!(
                    "[ToolRegistry] Endpoints of {} unavailable: {}",
                    name, e
                ));
                Vec::new()
            });
            report.push(AuxiliaryServerInfo {
                description: server.description(),
                version: server.version(),
                name,
                status,
                endpoints,
            });
        }
        report
    }

    /// Snapshot of the server list, so no lock is held across awaits
    fn server_handles(&self) -> Vec<(String, Arc<dyn AuxiliaryServer>)> {
        self.servers
            .read()
            .iter()
            .map(|s| (s.name.clone(), Arc::clone(&s.server)))
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_count())
            .field("servers", &self.server_count())
            .finish()
    }
}
