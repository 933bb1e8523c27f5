//! Tool manifest format
//!
//! A tool declares itself with a JSON manifest, either checked in as
//! `tool-manifest.json` or printed by its entry point when run as
//! `main describe`:
//!
//! ```json
//! {
//!   "name": "weather",
//!   "description": "Weather lookups",
//!   "version": "1.2.0",
//!   "command": ["python3", "weather.py"],
//!   "functions": [
//!     {
//!       "name": "forecast",
//!       "description": "Forecast for a city",
//!       "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Manifest file probed for in repositories and tool directories
pub const MANIFEST_FILE: &str = "tool-manifest.json";

/// Conventional executable entry point inside a tool directory
pub const ENTRY_POINT: &str = "main";

/// Version reported when the manifest does not declare one
pub const DEFAULT_TOOL_VERSION: &str = "0.1.0";

/// A tool's self-description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Argv prefix used to invoke functions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default)]
    pub functions: Vec<FunctionManifest>,
}

fn default_version() -> String {
    DEFAULT_TOOL_VERSION.to_string()
}

/// One declared function
///
/// Only functions carrying both a description and a parameter schema are
/// exposed; the rest are treated as untagged helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl FunctionManifest {
    /// Description and schema, when the function is tagged
    pub fn metadata(&self) -> Option<(&str, &Value)> {
        match (&self.description, &self.parameters) {
            (Some(description), Some(parameters)) if !self.name.is_empty() => {
                Some((description.as_str(), parameters))
            }
            _ => None,
        }
    }
}

impl ToolManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Functions that are tagged for exposure, in declaration order
    pub fn tagged_functions(&self) -> impl Iterator<Item = &FunctionManifest> {
        self.functions.iter().filter(|f| f.metadata().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let manifest = ToolManifest::from_json(r#"{"functions": []}"#).unwrap();
        assert_eq!(manifest.name, None);
        assert_eq!(manifest.version, "0.1.0");
        assert!(manifest.command.is_empty());
    }

    #[test]
    fn test_untagged_functions_are_skipped() {
        let manifest = ToolManifest::from_json(
            r#"{
                "name": "weather",
                "functions": [
                    {"name": "forecast", "description": "Forecast", "parameters": {"type": "object"}},
                    {"name": "helper"},
                    {"name": "no_schema", "description": "Missing parameters"}
                ]
            }"#,
        )
        .unwrap();

        let tagged: Vec<_> = manifest.tagged_functions().map(|f| f.name.as_str()).collect();
        assert_eq!(tagged, vec!["forecast"]);
    }
}
