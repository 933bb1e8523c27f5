//! Provider policy trait definition

use async_trait::async_trait;
use serde_json::Value;

use crate::runtime::{RuntimeSnapshot, SharedRuntime};
use crate::types::{BackendId, FunctionSchema, ModelDescriptor, ProviderInfo, RuntimeConfig};

use super::error::ProviderResult;

/// Backend-specific configuration and catalog rules
///
/// Each backend (OpenAI, Ollama, ...) implements this trait. Policies are
/// long-lived: the registry hands out the same instance on every resolve so
/// the model catalog cache survives between calls.
#[async_trait]
pub trait ProviderPolicy: Send + Sync {
    /// The backend this policy governs
    fn backend(&self) -> BackendId;

    /// Static description of the backend
    fn info(&self) -> ProviderInfo;

    /// The backend's model catalog
    ///
    /// Never fails: on any transport error, non-200 status or malformed
    /// payload the backend's static catalog is returned and a warning is
    /// logged.
    async fn list_models(&self) -> Vec<ModelDescriptor>;

    /// Backend-native details for one model
    ///
    /// Fails with `ModelNotFound` when `model_id` is absent from the
    /// current catalog snapshot.
    async fn get_model_details(&self, model_id: &str) -> ProviderResult<Value>;

    /// Forget the cached catalog so the next listing hits the network
    fn clear_model_cache(&self);

    /// Apply this backend's defaults and constraints to `config` and publish
    /// the result into the shared runtime
    ///
    /// Never fails: malformed inputs are logged and replaced by defaults.
    fn configure(&self, runtime: &SharedRuntime, config: &RuntimeConfig) -> std::sync::Arc<RuntimeSnapshot>;

    /// Tools this backend ships with
    fn get_default_tools(&self) -> Vec<FunctionSchema> {
        Vec::new()
    }
}
