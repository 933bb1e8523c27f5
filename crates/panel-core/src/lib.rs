//! Panel Core
//!
//! Backend-agnostic plumbing for a chat assistant that can switch between
//! language-model backends and extend itself with tools pulled from code
//! repositories.
//!
//! ## Providers
//!
//! ```rust,ignore
//! use panel_core::{BackendSwitch, ConfigurationResolver, ProviderRegistry, SharedRuntime};
//!
//! let resolver = ConfigurationResolver::from_process_env(logger.clone());
//! let registry = Arc::new(ProviderRegistry::new(&resolver, client, logger.clone()));
//! let switch = BackendSwitch::new(resolver, registry, Arc::new(SharedRuntime::new()), logger);
//!
//! let snapshot = switch.configure_str("deepseek", Some("deepseek-coder"))?;
//! assert_eq!(snapshot.state.context_window, 16000);
//! ```
//!
//! ## Tools
//!
//! ```rust,ignore
//! use panel_core::tools::ToolManager;
//!
//! let manager = ToolManager::new(&settings, client, logger);
//! let found = manager.search_tools("weather", &[], None).await;
//! manager.add_tool_from_repository(&found[0].clone_url, None).await?;
//!
//! // Feed the chat engine's function-calling surface
//! let functions = manager.registry().get_tool_functions();
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod resolver;
pub mod runtime;
pub mod providers;
pub mod tools;
pub mod mcp;
pub mod error;

// Re-export commonly used types
pub use types::{
    BackendId, FunctionSchema, ModelDescriptor, ProviderInfo, RepositoryCandidate,
    ResponseFragment, RuntimeConfig, RuntimeState, ToolCall, ToolResult,
    collect_response,
};

pub use logging::{ConsoleLogger, Logger, MemoryLogger, NoOpLogger, SharedLogger};

pub use config::{ConfigError, EnvSource, FileSettings, PanelSettings, ProcessEnv};

pub use resolver::{ConfigurationResolver, ProviderEndpoint};

pub use runtime::{RuntimeSnapshot, SharedRuntime};

pub use providers::{
    BackendSwitch, ProviderError, ProviderPolicy, ProviderRegistry, ProviderResult,
};

pub use tools::{LoadedTool, ToolError, ToolManager, ToolRegistry};

pub use mcp::{AuxiliaryServer, AuxiliaryServerInfo, McpClient, McpError, McpHttpServer};

pub use error::{ErrorPayload, PanelError, PanelResult};
