//! Core types shared across providers and tools

mod backend;
mod model;
mod repository;
mod runtime;
mod stream;
mod tool;

pub use backend::{BackendId, UnknownBackend};
pub use model::{ModelDescriptor, ProviderInfo};
pub use repository::RepositoryCandidate;
pub use runtime::{RuntimeConfig, RuntimeState};
pub use stream::{collect_response, ResponseFragment};
pub use tool::{empty_parameters, FunctionSchema, ToolCall, ToolResult};
