//! Model catalog and provider description types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::BackendId;

/// One entry of a backend's model catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Backend-specific model identifier
    pub id: String,
    /// Display name for the model
    pub name: String,
    /// Grouping key used for sorting and display
    pub family: String,
    /// Backend-native record as returned by the catalog endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ModelDescriptor {
    /// Create a descriptor without backend details
    pub fn new(id: impl Into<String>, name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            family: family.into(),
            details: None,
        }
    }

    /// Attach the backend-native record
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Static information about a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Backend identifier
    pub id: BackendId,
    /// Display name
    pub display_name: String,
    /// Default API base URL
    pub default_api_base: String,
    /// Whether an API key is required
    pub requires_api_key: bool,
    /// Model used when none is configured
    pub default_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_serialization_skips_missing_details() {
        let model = ModelDescriptor::new("gpt-4o", "GPT-4o", "GPT-4");
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"family\":\"GPT-4\""));
        assert!(!json.contains("details"));

        let detailed = model.with_details(json!({"owned_by": "openai"}));
        let json = serde_json::to_string(&detailed).unwrap();
        assert!(json.contains("\"owned_by\":\"openai\""));
    }
}
