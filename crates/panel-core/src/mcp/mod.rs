//! Auxiliary servers and the MCP (Model Context Protocol) client
//!
//! Auxiliary servers are long-running plugins registered with the tool
//! registry. [`AuxiliaryServer`] gives every handle the same four lifecycle
//! capabilities with no-op defaults; [`McpHttpServer`] is the built-in
//! implementation backed by the official rmcp SDK.
//!
//! # Example
//!
//! ```rust,ignore
//! use panel_core::mcp::{AuxiliaryServer, McpHttpServer};
//!
//! let server = McpHttpServer::new("files", "http://localhost:8931/mcp", logger);
//! server.start().await?;
//! let tools = server.list_tools().await?;
//! server.stop().await?;
//! ```

mod client;
mod server;

pub use client::{McpClient, McpError, McpResult};
pub use server::{AuxiliaryServer, AuxiliaryServerInfo, McpHttpServer, STATUS_UNKNOWN};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
