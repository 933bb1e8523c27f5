//! Tool discovery, acquisition, loading and registration
//!
//! ## Flow
//!
//! ```text
//! RepositoryDiscovery ──search──▶ RepositoryCandidate
//!                                      │ (caller picks one)
//!                                      ▼
//! ToolAcquisition ──shallow clone──▶ <tools_root>/<repo>_<suffix>/
//!                                      │
//!                                      ▼
//! ToolLoader ──manifest / main describe──▶ LoadedTool
//!                                      │
//!                                      ▼
//! ToolRegistry ──get_tool_functions──▶ function-calling schema
//! ```

mod acquisition;
mod discovery;
mod error;
mod loader;
mod manager;
mod manifest;
mod process;
mod registry;

pub use acquisition::{repository_name, ToolAcquisition, DEFAULT_BRANCH};
pub use discovery::{RepositoryDiscovery, MAX_PER_PAGE};
pub use error::{ToolError, ToolsResult};
pub use loader::{
    CommandCallable, LoadedTool, ToolCallable, ToolFunction, ToolLoader, DEFAULT_INVOKE_TIMEOUT,
};
pub use manager::ToolManager;
pub use manifest::{FunctionManifest, ToolManifest, DEFAULT_TOOL_VERSION, ENTRY_POINT, MANIFEST_FILE};
pub use registry::ToolRegistry;
