//! Backend provider policies
//!
//! Each supported backend has a [`ProviderPolicy`] that knows:
//! - where its model catalog lives and how to normalize it
//! - which static catalog to serve when the live one is unavailable
//! - how to turn a [`RuntimeConfig`](crate::types::RuntimeConfig) into the
//!   runtime state the chat engine executes with
//!
//! The [`ProviderRegistry`] maps a [`BackendId`](crate::types::BackendId) to
//! its policy, and [`BackendSwitch`] drives a full reconfiguration including
//! the hosted-primary fallback.

mod catalog;
mod deepseek;
mod defaults;
mod error;
mod http;
mod mhw;
mod ollama;
mod openai;
mod registry;
mod switch;
mod traits;

// Core traits and types
pub use error::{ProviderError, ProviderResult};
pub use traits::ProviderPolicy;

// Catalogs
pub use catalog::{title_case, CatalogFormat, ModelCatalog};

// Backend policies
pub use deepseek::{DeepSeekCatalog, DeepSeekPolicy};
pub use mhw::{MhwCatalog, MhwPolicy};
pub use ollama::{namespaced_model, OllamaCatalog, OllamaPolicy};
pub use openai::{OpenAiCatalog, OpenAiPolicy};

// Resolution and switching
pub use registry::ProviderRegistry;
pub use switch::BackendSwitch;

pub use defaults::{backend_defaults, BackendDefaults, DEEPSEEK_CODER_BUDGET, OLLAMA_NAMESPACE};
pub use http::{build_client, USER_AGENT};
